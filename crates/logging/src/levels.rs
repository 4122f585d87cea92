//! Flag enums and level structures for info and debug verbosity.

/// Info flags for user-facing diagnostic categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfoFlag {
    /// Dispatcher argument resolution.
    Dispatch,
    /// Directory listing progress.
    List,
    /// Stream totals reported when a command finishes.
    Stats,
}

/// Debug flags for internal diagnostic categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DebugFlag {
    /// Device open, read, write and close.
    Device,
    /// Stop and cancellation propagation.
    Stop,
    /// Reader and writer state transitions.
    Stream,
    /// Transform producer lifecycle.
    Transform,
    /// Traversal visits, filtering and directory reads.
    Walk,
}

/// Info verbosity levels for each flag.
#[derive(Clone, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfoLevels {
    /// Dispatcher level.
    pub dispatch: u8,
    /// Listing level.
    pub list: u8,
    /// Statistics level.
    pub stats: u8,
}

impl InfoLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: InfoFlag) -> u8 {
        match flag {
            InfoFlag::Dispatch => self.dispatch,
            InfoFlag::List => self.list,
            InfoFlag::Stats => self.stats,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: InfoFlag, level: u8) {
        match flag {
            InfoFlag::Dispatch => self.dispatch = level,
            InfoFlag::List => self.list = level,
            InfoFlag::Stats => self.stats = level,
        }
    }

    /// Set all flags to the specified level.
    pub fn set_all(&mut self, level: u8) {
        self.dispatch = level;
        self.list = level;
        self.stats = level;
    }
}

/// Debug verbosity levels for each flag.
#[derive(Clone, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugLevels {
    /// Device level.
    pub device: u8,
    /// Stop propagation level.
    pub stop: u8,
    /// Stream state level.
    pub stream: u8,
    /// Transform producer level.
    pub transform: u8,
    /// Traversal level.
    pub walk: u8,
}

impl DebugLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Device => self.device,
            DebugFlag::Stop => self.stop,
            DebugFlag::Stream => self.stream,
            DebugFlag::Transform => self.transform,
            DebugFlag::Walk => self.walk,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: DebugFlag, level: u8) {
        match flag {
            DebugFlag::Device => self.device = level,
            DebugFlag::Stop => self.stop = level,
            DebugFlag::Stream => self.stream = level,
            DebugFlag::Transform => self.transform = level,
            DebugFlag::Walk => self.walk = level,
        }
    }

    /// Set all flags to the specified level.
    pub fn set_all(&mut self, level: u8) {
        self.device = level;
        self.stop = level;
        self.stream = level;
        self.transform = level;
        self.walk = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_levels_default_to_zero() {
        let levels = InfoLevels::default();
        assert_eq!(levels.get(InfoFlag::Dispatch), 0);
        assert_eq!(levels.get(InfoFlag::List), 0);
        assert_eq!(levels.get(InfoFlag::Stats), 0);
    }

    #[test]
    fn info_set_touches_only_one_flag() {
        let mut levels = InfoLevels::default();
        levels.set(InfoFlag::List, 2);
        assert_eq!(levels.list, 2);
        assert_eq!(levels.dispatch, 0);
        assert_eq!(levels.stats, 0);
    }

    #[test]
    fn debug_set_all_then_override() {
        let mut levels = DebugLevels::default();
        levels.set_all(3);
        levels.set(DebugFlag::Walk, 1);
        assert_eq!(levels.get(DebugFlag::Device), 3);
        assert_eq!(levels.get(DebugFlag::Stop), 3);
        assert_eq!(levels.get(DebugFlag::Stream), 3);
        assert_eq!(levels.get(DebugFlag::Transform), 3);
        assert_eq!(levels.get(DebugFlag::Walk), 1);
    }
}
