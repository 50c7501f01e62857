pub mod preferences;

pub use preferences::{
    MergePreferences, Preferences, PreferencesError, PreferencesStore, PrintPreferences,
};
