use std::env;

use rfd::FileDialog;

use crate::{DialogHost, DialogOutcome, DialogRequest};

/// Shows the platform's own open-file dialog.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeDialogHost;

impl DialogHost for NativeDialogHost {
    fn show(&mut self, request: &DialogRequest) -> DialogOutcome {
        let saved_dir = if request.restore_directory {
            env::current_dir().ok()
        } else {
            None
        };

        let mut dialog = FileDialog::new().set_directory(&request.initial_directory);
        for filter in request.ordered_filters() {
            dialog = dialog.add_filter(filter.description.as_str(), filter.extensions().as_slice());
        }
        let picked = dialog.pick_file();

        if let Some(dir) = saved_dir {
            if let Err(err) = env::set_current_dir(&dir) {
                tracing::warn!("Failed to restore working directory {}: {err}", dir.display());
            }
        }

        match picked {
            Some(path) => DialogOutcome::Selected(path),
            None => DialogOutcome::Cancelled,
        }
    }
}
