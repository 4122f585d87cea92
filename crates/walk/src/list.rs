use std::sync::Arc;

use stream::{ChannelWriter, ReaderExt, StreamError, TransformReader, Writer, empty_reader};

use crate::entry::{ListEntry, root_name};
use crate::error::WalkError;
use crate::fs::{FileSystem, LocalFs};
use crate::options::{Accept, ListOptions, Recurse};

/// Pending work of a listing.
enum Step {
    /// Stat `path` and process it.
    Visit {
        path: String,
        name: String,
        depth: usize,
    },
    /// Emit a directory once its descendants are done.
    Emit(ListEntry),
}

/// Lists `path` through `fs`.
///
/// The returned reader does nothing until its first `read`. With
/// [`Recurse::Off`] it yields the root's direct children; otherwise it yields
/// the root and every descendant, directories before ([`Recurse::Preorder`])
/// or after ([`Recurse::Postorder`]) their contents. Children appear in the
/// order `fs` enumerates them.
///
/// A stat or read-dir failure ends the listing; the consumer's `read` fails
/// with [`StreamError::Upstream`] wrapping a [`WalkError`].
pub fn list(
    fs: Arc<dyn FileSystem>,
    path: impl Into<String>,
    options: ListOptions,
) -> TransformReader<ListEntry> {
    let root = path.into();
    empty_reader::<()>().transform(move |_, mut sink| async move {
        let result = traverse(fs.as_ref(), root, &options, &mut sink).await;
        match result {
            Ok(()) => sink.end().await,
            Err(err) => Err(err),
        }
    })
}

/// Positional form of [`list`].
pub fn list_with(
    fs: Arc<dyn FileSystem>,
    path: impl Into<String>,
    recurse: impl Into<Recurse>,
    accept: Option<Accept>,
) -> TransformReader<ListEntry> {
    let options = ListOptions {
        recurse: recurse.into(),
        accept,
    };
    list(fs, path, options)
}

/// Lists `path` on the local filesystem.
pub fn list_local(path: impl Into<String>, options: ListOptions) -> TransformReader<ListEntry> {
    list(Arc::new(LocalFs), path, options)
}

async fn traverse(
    fs: &dyn FileSystem,
    root: String,
    options: &ListOptions,
    sink: &mut ChannelWriter<ListEntry>,
) -> Result<(), StreamError> {
    let recurse = options.recurse;
    logging::trace_list!(root = %root, ?recurse, "listing");

    let name = root_name(&root).to_owned();
    let mut stack = vec![Step::Visit {
        path: root,
        name,
        depth: 0,
    }];
    let mut emitted = 0usize;

    while let Some(step) = stack.pop() {
        let (path, name, depth) = match step {
            Step::Emit(entry) => {
                sink.write(entry).await?;
                emitted += 1;
                continue;
            }
            Step::Visit { path, name, depth } => (path, name, depth),
        };

        let stat = fs
            .stat(&path)
            .await
            .map_err(|source| StreamError::upstream(WalkError::stat(path.as_str(), source)))?;
        let entry = ListEntry::new(path, name, depth, stat);

        if !options.accepts(&entry) {
            logging::trace_walk!(path = entry.path(), "excluded by accept");
            continue;
        }

        let emit = recurse.is_on() || depth == 1;
        let postorder = recurse == Recurse::Postorder;
        let descend = entry.stat().is_dir() && (recurse.is_on() || depth == 0);

        if emit && !postorder {
            sink.write(entry.clone()).await?;
            emitted += 1;
        }

        if descend {
            let children = fs.read_dir(entry.path()).await.map_err(|source| {
                StreamError::upstream(WalkError::read_dir(entry.path(), source))
            })?;
            logging::trace_walk!(path = entry.path(), children = children.len(), "read directory");

            let parent = entry.path().to_owned();
            if emit && postorder {
                stack.push(Step::Emit(entry));
            }
            stack.extend(children.into_iter().rev().map(|child| Step::Visit {
                path: format!("{parent}/{child}"),
                name: child,
                depth: depth + 1,
            }));
        } else if emit && postorder {
            sink.write(entry).await?;
            emitted += 1;
        }
    }

    logging::trace_stats!(emitted, "listing finished");
    Ok(())
}
