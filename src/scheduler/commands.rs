use std::str::FromStr;

use anyhow::{anyhow, bail, Error};
use serde::Serialize;

use crate::models::Channel;

use super::{Scheduler, SessionSnapshot, SurfResult};

/// One user action on the control surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Power,
    Mute,
    ChannelUp,
    ChannelDown,
    ChannelJump(i64),
    VolumeUp,
    VolumeDown,
    SubmitList(String),
    Status,
}

impl FromStr for ControlCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            bail!("empty command");
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "power" | "p" => ControlCommand::Power,
            "mute" | "m" => ControlCommand::Mute,
            "up" | "next" | "n" | "+" => ControlCommand::ChannelUp,
            "down" | "prev" | "b" | "-" => ControlCommand::ChannelDown,
            "jump" | "j" => {
                let id = parts
                    .next()
                    .ok_or_else(|| anyhow!("jump needs a channel id"))?;
                let id = id
                    .parse()
                    .map_err(|_| anyhow!("invalid channel id '{id}'"))?;
                ControlCommand::ChannelJump(id)
            }
            "vol+" | "louder" => ControlCommand::VolumeUp,
            "vol-" | "quieter" => ControlCommand::VolumeDown,
            "submit" => {
                let url = parts
                    .next()
                    .ok_or_else(|| anyhow!("submit needs a video list url"))?;
                ControlCommand::SubmitList(url.to_string())
            }
            "status" | "s" => ControlCommand::Status,
            other => bail!("unknown command '{other}'"),
        };

        if parts.next().is_some() {
            bail!("unexpected arguments after '{verb}'");
        }
        Ok(command)
    }
}

/// What a command did, in a form the host can print or forward.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum CommandOutcome {
    Power { on: bool },
    Muted { muted: bool },
    #[serde(rename_all = "camelCase")]
    Tuned { channel_id: i64, name: String },
    Volume { volume: u8 },
    Submitted { replaced: bool },
    Status { snapshot: SessionSnapshot },
}

pub async fn dispatch(scheduler: &Scheduler, command: ControlCommand) -> SurfResult<CommandOutcome> {
    let outcome = match command {
        ControlCommand::Power => CommandOutcome::Power {
            on: scheduler.power_toggle().await,
        },
        ControlCommand::Mute => CommandOutcome::Muted {
            muted: scheduler.mute_toggle().await,
        },
        ControlCommand::ChannelUp => tuned(scheduler.channel_up().await?),
        ControlCommand::ChannelDown => tuned(scheduler.channel_down().await?),
        ControlCommand::ChannelJump(id) => tuned(scheduler.channel_jump(id).await?),
        ControlCommand::VolumeUp => CommandOutcome::Volume {
            volume: scheduler.volume_up().await,
        },
        ControlCommand::VolumeDown => CommandOutcome::Volume {
            volume: scheduler.volume_down().await,
        },
        ControlCommand::SubmitList(url) => {
            scheduler.mark_interaction().await;
            CommandOutcome::Submitted {
                replaced: scheduler.submit_list(&url).await?,
            }
        }
        ControlCommand::Status => CommandOutcome::Status {
            snapshot: scheduler.snapshot().await,
        },
    };
    Ok(outcome)
}

fn tuned(channel: Channel) -> CommandOutcome {
    CommandOutcome::Tuned {
        channel_id: channel.id,
        name: channel.name,
    }
}
