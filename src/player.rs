//! Currently-playing lookup and the background poller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::{
    client::SpotifyClient,
    error::{Error, Result},
    types::{CurrentlyPlayingResponse, Track},
};

/// Default polling period of the now-playing poller.
pub const POLL_PERIOD: Duration = Duration::from_secs(1);

impl SpotifyClient {
    /// The track playing right now, if any.
    ///
    /// `None` covers an idle player (204 No Content) as well as a playing
    /// item that is not a track.
    pub async fn currently_playing(&self) -> Result<Option<Track>> {
        let response = self.get("/me/player/currently-playing", None).await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Http { status });
        }

        let playing: CurrentlyPlayingResponse = response.json().await?;
        Ok(playing.item.and_then(|item| item.into_track()))
    }
}

enum PollerCommand {
    SetVisible(bool),
    Dispose,
}

/// Handle to a background task that watches the playing track.
///
/// The task emits on the returned channel whenever the playing track's
/// identity changes, including to and from "nothing playing"; repeats of
/// the same track are suppressed. While hidden the timer is disarmed and no
/// requests go out. Disposing, which also happens on drop, stops the task
/// for good; nothing is emitted afterwards.
pub struct NowPlayingPoller {
    commands: UnboundedSender<PollerCommand>,
}

impl NowPlayingPoller {
    /// Spawns the polling task with the default one-second period.
    pub fn spawn(client: Arc<SpotifyClient>) -> (Self, UnboundedReceiver<Option<Track>>) {
        Self::spawn_with_period(client, POLL_PERIOD)
    }

    pub fn spawn_with_period(
        client: Arc<SpotifyClient>,
        period: Duration,
    ) -> (Self, UnboundedReceiver<Option<Track>>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        tokio::spawn(poll_loop(client, period, command_rx, update_tx));

        (
            NowPlayingPoller {
                commands: command_tx,
            },
            update_rx,
        )
    }

    /// Pauses (`false`) or resumes (`true`) polling. Resuming re-arms the
    /// timer, which polls again right away.
    pub fn set_visible(&self, visible: bool) {
        let _ = self.commands.send(PollerCommand::SetVisible(visible));
    }

    /// Stops the polling task from any state.
    pub fn dispose(&self) {
        let _ = self.commands.send(PollerCommand::Dispose);
    }
}

impl Drop for NowPlayingPoller {
    fn drop(&mut self) {
        let _ = self.commands.send(PollerCommand::Dispose);
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = time::interval(period);
    // a fetch outlasting the period delays the next tick instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Applies one command to the timer state; true means disposed.
fn apply_command(command: PollerCommand, ticker: &mut Option<Interval>, period: Duration) -> bool {
    match command {
        PollerCommand::SetVisible(true) => {
            if ticker.is_none() {
                debug!("now-playing poller resumed");
                *ticker = Some(new_ticker(period));
            }
            false
        }
        PollerCommand::SetVisible(false) => {
            debug!("now-playing poller paused");
            *ticker = None;
            false
        }
        PollerCommand::Dispose => true,
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn poll_loop(
    client: Arc<SpotifyClient>,
    period: Duration,
    mut commands: UnboundedReceiver<PollerCommand>,
    updates: UnboundedSender<Option<Track>>,
) {
    let mut ticker = Some(new_ticker(period));
    let mut last_track_id: Option<String> = None;

    loop {
        tokio::select! {
            command = commands.recv() => {
                let disposed = match command {
                    Some(command) => apply_command(command, &mut ticker, period),
                    None => true,
                };
                if disposed {
                    debug!("now-playing poller disposed");
                    return;
                }
            }
            _ = tick(&mut ticker), if ticker.is_some() => {
                let playing = match client.currently_playing().await {
                    Ok(playing) => playing,
                    Err(e) => {
                        warn!("now-playing poll failed: {}", e);
                        continue;
                    }
                };

                // commands that raced the fetch win over its result
                let mut disposed = false;
                while let Ok(command) = commands.try_recv() {
                    disposed |= apply_command(command, &mut ticker, period);
                }
                if disposed {
                    debug!("now-playing poller disposed");
                    return;
                }

                let track_id = playing.as_ref().map(|track| track.id.clone());
                if track_id != last_track_id {
                    last_track_id = track_id;
                    if updates.send(playing).is_err() {
                        // nobody is listening anymore
                        return;
                    }
                }
            }
        }
    }
}
