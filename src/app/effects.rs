use std::io::{Write, stdout};
use std::time::Duration;

use base64::Engine;

use crate::app::{App, Message, Model, ToastLevel};
use crate::watcher::FileWatcher;

impl App {
    pub(super) fn make_file_watcher(model: &Model) -> notify::Result<FileWatcher> {
        FileWatcher::new(&model.file_path, Duration::from_millis(200))
    }

    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        msg: &Message,
    ) {
        match msg {
            Message::ToggleWatch => {
                if model.watch_enabled {
                    match Self::make_file_watcher(model) {
                        Ok(watcher) => {
                            *file_watcher = Some(watcher);
                            model.show_toast(ToastLevel::Info, "Watching file changes");
                        }
                        Err(err) => {
                            model.watch_enabled = false;
                            *file_watcher = None;
                            model.show_toast(
                                ToastLevel::Warning,
                                format!("Watch unavailable: {err}"),
                            );
                            crate::perf::log_event(
                                "watcher.error",
                                format!("failed path={} err={err}", model.file_path.display()),
                            );
                        }
                    }
                } else {
                    *file_watcher = None;
                    model.show_toast(ToastLevel::Info, "Watch disabled");
                }
            }
            Message::Save => {
                Self::save_buffer(model);
            }
            Message::FileChanged => {
                if let Err(err) = model.reload_from_disk() {
                    model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
                    crate::perf::log_event(
                        "reload.error",
                        format!("failed path={} err={err}", model.file_path.display()),
                    );
                }
            }
            Message::ForceReload => {
                Self::force_reload(model);
            }
            Message::ExportHtml => {
                Self::export_html(model);
            }
            Message::EndSelection(_) => {
                Self::copy_selection(model);
                model.clear_selection();
            }
            _ => {}
        }
    }

    /// Write the buffer to disk, honoring the disk-conflict flow: a save
    /// under a conflict warns first and only a repeated save overwrites.
    fn save_buffer(model: &mut Model) {
        if model.disk_conflict && !model.save_confirmed {
            let disk_now = model.file_disk_hash();
            if disk_now != model.disk_hash {
                model.save_confirmed = true;
                model.show_toast(
                    ToastLevel::Warning,
                    "File changed on disk! Press Ctrl+S again to overwrite",
                );
                return;
            }
        }

        let text = model.buffer.text();
        match std::fs::write(&model.file_path, &text) {
            Ok(()) => {
                model.buffer.mark_clean();
                model.disk_hash = model.file_disk_hash();
                model.disk_conflict = false;
                model.save_confirmed = false;
                model.show_toast(
                    ToastLevel::Info,
                    format!("Saved {}", model.file_path.display()),
                );
            }
            Err(err) => {
                model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
            }
        }
    }

    /// Reload from disk regardless of buffer dirtiness (F5).
    fn force_reload(model: &mut Model) {
        match std::fs::read_to_string(&model.file_path) {
            Ok(text) => {
                model.buffer.replace_all(&text);
                model.store.set(text);
                model.disk_hash = model.file_disk_hash();
                model.disk_conflict = false;
                model.clamp_editor_scroll();
                model.show_toast(ToastLevel::Info, "Reloaded from disk");
            }
            Err(err) => {
                model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
            }
        }
    }

    /// Export the current source as a standalone HTML file next to it.
    fn export_html(model: &mut Model) {
        let output = model.file_path.with_extension("html");
        match crate::export::write_html(model.store.get(), &output) {
            Ok(()) => {
                model.show_toast(ToastLevel::Info, format!("Exported {}", output.display()));
            }
            Err(err) => {
                model.show_toast(ToastLevel::Error, format!("Export failed: {err}"));
            }
        }
    }

    fn copy_selection(model: &mut Model) {
        let Some((text, lines)) = model.selected_text() else {
            return;
        };
        if text.is_empty() {
            return;
        }
        match copy_to_clipboard(&text) {
            Ok(()) => model.show_toast(ToastLevel::Info, format!("Copied {lines} line(s)")),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
        }
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

#[cfg(test)]
mod tests {
    use super::osc52_sequence;

    #[test]
    fn test_osc52_sequence_encodes_text() {
        let seq = osc52_sequence("hi");
        assert_eq!(seq, "\x1b]52;c;aGk=\x07");
    }
}
