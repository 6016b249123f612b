mod filter;
mod native;

use std::path::PathBuf;

pub use filter::{FileFilter, parse_filter};
pub use native::NativeDialogHost;
pub use toolbelt_core::Result;

pub const DEFAULT_FILTER: &str = "All files (*.*)|*.*";
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Settings read each time the dialog is opened.
#[derive(Clone, Debug)]
pub struct DialogConfig {
    pub initial_directory: PathBuf,
    /// `Description|pattern` pairs, e.g. `Images|*.png;*.jpg|All files|*.*`.
    pub filter: String,
    /// 1-based index of the filter selected when the dialog opens.
    pub filter_index: usize,
    /// Restore the working directory after the dialog closes.
    pub restore_directory: bool,
    /// How many times the dialog is shown while the host keeps asking to retry.
    pub max_attempts: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        let root = if cfg!(windows) { "C:\\" } else { "/" };
        Self {
            initial_directory: PathBuf::from(root),
            filter: DEFAULT_FILTER.into(),
            filter_index: 1,
            restore_directory: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl DialogConfig {
    pub fn request(&self) -> Result<DialogRequest> {
        Ok(DialogRequest {
            initial_directory: self.initial_directory.clone(),
            filters: parse_filter(&self.filter)?,
            filter_index: self.filter_index,
            restore_directory: self.restore_directory,
        })
    }
}

#[derive(Clone, Debug)]
pub struct DialogRequest {
    pub initial_directory: PathBuf,
    pub filters: Vec<FileFilter>,
    pub filter_index: usize,
    pub restore_directory: bool,
}

impl DialogRequest {
    /// Filters with the selected one first. Out-of-range indexes select the first.
    pub fn ordered_filters(&self) -> Vec<&FileFilter> {
        let selected = self
            .filter_index
            .checked_sub(1)
            .filter(|idx| *idx < self.filters.len())
            .unwrap_or(0);
        let mut ordered: Vec<&FileFilter> = Vec::with_capacity(self.filters.len());
        ordered.extend(self.filters.get(selected));
        ordered.extend(
            self.filters
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != selected)
                .map(|(_, filter)| filter),
        );
        ordered
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogOutcome {
    Selected(PathBuf),
    Retry,
    Cancelled,
}

/// Whatever actually puts a dialog on screen.
pub trait DialogHost {
    fn show(&mut self, request: &DialogRequest) -> DialogOutcome;
}

pub struct FileDialogHandler<H: DialogHost = NativeDialogHost> {
    config: DialogConfig,
    host: H,
}

impl FileDialogHandler<NativeDialogHost> {
    pub fn new(config: DialogConfig) -> Self {
        Self::with_host(config, NativeDialogHost)
    }
}

impl<H: DialogHost> FileDialogHandler<H> {
    pub fn with_host(config: DialogConfig, host: H) -> Self {
        Self { config, host }
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DialogConfig {
        &mut self.config
    }

    /// Shows the dialog and returns the chosen path, or `None` when nothing
    /// was chosen.
    pub fn open_file_selector(&mut self) -> Result<Option<PathBuf>> {
        let request = self.config.request()?;
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.host.show(&request) {
                DialogOutcome::Selected(path) => {
                    tracing::debug!("Selected {}", path.display());
                    return Ok(Some(path));
                }
                DialogOutcome::Cancelled => return Ok(None),
                DialogOutcome::Retry => tracing::debug!(attempt, "File dialog asked to retry."),
            }
        }
        tracing::warn!(attempts, "File dialog still asking to retry, giving up.");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct ScriptedHost {
        outcomes: VecDeque<DialogOutcome>,
        shown: usize,
    }

    impl ScriptedHost {
        fn new(outcomes: impl IntoIterator<Item = DialogOutcome>) -> Self {
            Self {
                outcomes: outcomes.into_iter().collect(),
                shown: 0,
            }
        }
    }

    impl DialogHost for ScriptedHost {
        fn show(&mut self, _request: &DialogRequest) -> DialogOutcome {
            self.shown += 1;
            self.outcomes.pop_front().unwrap_or(DialogOutcome::Retry)
        }
    }

    #[test]
    fn ok_returns_selected_path() {
        let host = ScriptedHost::new([DialogOutcome::Selected("/tmp/x".into())]);
        let mut handler = FileDialogHandler::with_host(DialogConfig::default(), host);
        assert_eq!(
            handler.open_file_selector().unwrap(),
            Some(PathBuf::from("/tmp/x"))
        );
    }

    #[test]
    fn cancel_returns_nothing() {
        let host = ScriptedHost::new([DialogOutcome::Cancelled]);
        let mut handler = FileDialogHandler::with_host(DialogConfig::default(), host);
        assert_eq!(handler.open_file_selector().unwrap(), None);
    }

    #[test]
    fn retry_shows_the_dialog_again() {
        let host = ScriptedHost::new([
            DialogOutcome::Retry,
            DialogOutcome::Selected("/tmp/y".into()),
        ]);
        let mut handler = FileDialogHandler::with_host(DialogConfig::default(), host);
        assert_eq!(
            handler.open_file_selector().unwrap(),
            Some(PathBuf::from("/tmp/y"))
        );
        assert_eq!(handler.host.shown, 2);
    }

    #[test]
    fn endless_retry_is_bounded() {
        let mut handler =
            FileDialogHandler::with_host(DialogConfig::default(), ScriptedHost::new([]));
        assert_eq!(handler.open_file_selector().unwrap(), None);
        assert_eq!(handler.host.shown, DEFAULT_MAX_ATTEMPTS);

        handler.config_mut().max_attempts = 0;
        handler.host.shown = 0;
        assert_eq!(handler.open_file_selector().unwrap(), None);
        assert_eq!(handler.host.shown, 1);
    }

    #[test]
    fn invalid_filter_fails_before_showing() {
        let config = DialogConfig {
            filter: "Images".into(),
            ..Default::default()
        };
        let mut handler = FileDialogHandler::with_host(config, ScriptedHost::new([]));
        assert!(handler.open_file_selector().is_err());
        assert_eq!(handler.host.shown, 0);
    }

    #[test]
    fn filter_index_selects_the_first_offered_filter() {
        let config = DialogConfig {
            filter: "Images|*.png|Text|*.txt|All files|*.*".into(),
            filter_index: 2,
            ..Default::default()
        };
        let request = config.request().unwrap();
        let names: Vec<&str> = request
            .ordered_filters()
            .iter()
            .map(|filter| filter.description.as_str())
            .collect();
        assert_eq!(names, vec!["Text", "Images", "All files"]);

        let out_of_range = DialogRequest {
            filter_index: 9,
            ..request
        };
        assert_eq!(out_of_range.ordered_filters()[0].description, "Images");
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DialogConfig::default();
        assert_eq!(config.filter, "All files (*.*)|*.*");
        assert_eq!(config.filter_index, 1);
        assert!(config.restore_directory);
    }
}
