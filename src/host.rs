//! Headless host: replays a JSON-lines script of page and user events against
//! a simulated platform and prints what the presentation layer would render.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use crate::fullscreen::SimulatedFullscreen;
use crate::language::Language;
use crate::media::{ExclusiveCapture, SimulatedCapture, SimulatedMediaConfig, StreamKind};
use crate::mouse::PointerEvent;
use crate::session::{Presenter, SessionController, ViewModel};
use crate::settings::SettingsStore;
use crate::summary::SessionSummary;
use crate::violations::InputEvent;

/// One line of a host script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostCommand {
    /// How the simulated platform answers. Only honoured as the first line.
    #[serde(rename_all = "camelCase")]
    Configure {
        #[serde(default)]
        media: SimulatedMediaConfig,
        #[serde(default = "default_true")]
        fullscreen_supported: bool,
    },
    Start,
    End,
    Acknowledge,
    Language {
        language: Language,
    },
    /// Toggle per-key debug entries in the activity log.
    Verbose {
        enabled: bool,
    },
    Input {
        event: InputEvent,
    },
    Pointer {
        event: PointerEvent,
    },
    /// The user entered or left fullscreen outside of a request.
    Fullscreen {
        active: bool,
    },
    TrackEnded {
        kind: StreamKind,
    },
    Wait {
        millis: u64,
    },
}

fn default_true() -> bool {
    true
}

/// What the host prints, one JSON object per line.
#[derive(Debug, Serialize)]
#[serde(tag = "output", rename_all = "camelCase")]
enum HostOutput<'a> {
    View { view: &'a ViewModel },
    Suppressed { event: &'a InputEvent },
    Template { language: Language, template: &'a str },
    Error { message: String },
    Summary { summary: &'a SessionSummary, text: String },
}

struct JsonLinesPresenter;

impl JsonLinesPresenter {
    fn emit(&self, output: &HostOutput<'_>) {
        let line = match serde_json::to_string(output) {
            Ok(line) => line,
            Err(err) => {
                log::error!("failed to serialize host output: {err}");
                return;
            }
        };
        let mut out = io::stdout().lock();
        if let Err(err) = writeln!(out, "{line}") {
            log::error!("failed to write host output: {err}");
        }
    }
}

impl Presenter for JsonLinesPresenter {
    fn present(&self, view: &ViewModel) {
        self.emit(&HostOutput::View { view });
    }
}

pub fn parse_script(contents: &str) -> Result<Vec<HostCommand>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("invalid host command on line {}", index + 1))
        })
        .collect()
}

/// Replay `script` and write any captured recording next to it.
pub async fn replay(script: &Path, settings: &SettingsStore) -> Result<()> {
    let contents = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let mut commands = parse_script(&contents)?;

    let (media_config, fullscreen_supported) = match commands.first() {
        Some(HostCommand::Configure {
            media,
            fullscreen_supported,
        }) => {
            let configured = (media.clone(), *fullscreen_supported);
            commands.remove(0);
            configured
        }
        _ => (SimulatedMediaConfig::default(), true),
    };

    let presenter = Arc::new(JsonLinesPresenter);
    let fullscreen = Arc::new(SimulatedFullscreen::new(fullscreen_supported));
    let (media, foreign_captures) =
        ExclusiveCapture::with_refusal_reports(SimulatedCapture::new(media_config));
    let controller = SessionController::new(
        settings.monitor(),
        settings.verbose_key_logging(),
        Arc::new(media),
        fullscreen.clone(),
        presenter.clone(),
    );
    controller.watch_foreign_captures(foreign_captures);
    controller.change_language(settings.language()).await;

    for command in commands {
        match command {
            HostCommand::Configure { .. } => {
                log::warn!("configure is only honoured as the first command; ignored");
            }
            HostCommand::Start => {
                if let Err(err) = controller.start().await {
                    presenter.emit(&HostOutput::Error {
                        message: format!("{err:#}"),
                    });
                }
            }
            HostCommand::End => {
                if let Some(summary) = controller.end().await {
                    presenter.emit(&HostOutput::Summary {
                        text: summary.to_string(),
                        summary: &summary,
                    });
                    save_recording(&controller, script).await?;
                }
            }
            HostCommand::Acknowledge => controller.acknowledge_warning().await,
            HostCommand::Language { language } => {
                let template = controller.change_language(language).await;
                presenter.emit(&HostOutput::Template { language, template });
                if let Err(err) = settings.update_language(language) {
                    log::warn!("language preference not saved: {err:#}");
                }
            }
            HostCommand::Verbose { enabled } => {
                controller.set_verbose(enabled).await;
                if let Err(err) = settings.update_verbose_key_logging(enabled) {
                    log::warn!("verbose key logging preference not saved: {err:#}");
                }
            }
            HostCommand::Input { event } => {
                if controller.handle_input(event.clone()).await.suppress_default {
                    presenter.emit(&HostOutput::Suppressed { event: &event });
                }
            }
            HostCommand::Pointer { event } => controller.handle_pointer(event).await,
            HostCommand::Fullscreen { active } => {
                fullscreen.set_active(active);
                controller.on_fullscreen_change().await;
            }
            HostCommand::TrackEnded { kind } => controller.on_track_ended(kind).await,
            HostCommand::Wait { millis } => sleep(Duration::from_millis(millis)).await,
        }
    }

    Ok(())
}

async fn save_recording(controller: &SessionController, script: &Path) -> Result<()> {
    let Some(recording) = controller.recording().await else {
        return Ok(());
    };
    let path = script.with_file_name(&recording.file_name);
    std::fs::write(&path, &recording.bytes)
        .with_context(|| format!("Failed to write recording to {}", path.display()))?;
    log::info!("screen recording written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_script, HostCommand};
    use crate::media::SimulatedGrant;
    use crate::violations::InputEvent;

    #[test]
    fn parses_a_script_and_skips_comments() {
        let script = r#"
# camera denied, screen granted
{"command": "configure", "media": {"camera": "deny"}}
{"command": "start"}
{"command": "input", "event": {"type": "visibility", "hidden": true}}
{"command": "wait", "millis": 1500}
{"command": "verbose", "enabled": true}
{"command": "end"}
"#;
        let commands = parse_script(script).expect("parse");
        assert_eq!(commands.len(), 6);
        match &commands[0] {
            HostCommand::Configure {
                media,
                fullscreen_supported,
            } => {
                assert_eq!(media.camera, SimulatedGrant::Deny);
                assert_eq!(media.screen, SimulatedGrant::Allow);
                assert!(*fullscreen_supported);
            }
            other => panic!("unexpected first command {other:?}"),
        }
        assert_eq!(
            commands[2],
            HostCommand::Input {
                event: InputEvent::Visibility { hidden: true }
            }
        );
        assert_eq!(commands[4], HostCommand::Verbose { enabled: true });
    }

    #[test]
    fn reports_the_offending_line() {
        let err = parse_script("{\"command\": \"start\"}\n{\"command\": \"jump\"}").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
