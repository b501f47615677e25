//! Headless frame loop: server events in, one session step per tick out.

use chase_protocol::Winner;
use chase_tick::TickSource;
use chase_transport::{Connection, TransportError};

use crate::{ClientError, ClientLink, ClientSession, InputSource, SessionEffect};

/// Why [`run_session`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    GameOver(Winner),
    /// The server closed the connection.
    Disconnected,
    /// The tick source ran dry first.
    OutOfTicks,
}

/// Drives `session` until the round ends, the server goes away, or `ticks`
/// is exhausted.
///
/// Every server event is applied as soon as it arrives. On each tick the
/// session steps with the current input and everything it produces is sent.
/// `on_effect` sees each [`SessionEffect`] in order.
pub async fn run_session<C, I, T, F>(
    link: &mut ClientLink<C>,
    session: &mut ClientSession,
    input: &mut I,
    ticks: &mut T,
    mut on_effect: F,
) -> Result<SessionOutcome, ClientError>
where
    C: Connection<Error = TransportError>,
    I: InputSource,
    T: TickSource,
    F: FnMut(&SessionEffect),
{
    loop {
        tokio::select! {
            event = link.recv() => {
                let Some(event) = event? else {
                    tracing::info!(player_id = %link.player_id(), "server closed the session");
                    return Ok(SessionOutcome::Disconnected);
                };
                for effect in session.apply(event) {
                    on_effect(&effect);
                    if let SessionEffect::GameOver { winner } = effect {
                        return Ok(SessionOutcome::GameOver(winner));
                    }
                }
            }
            tick = ticks.next_tick() => {
                let Some(tick) = tick else {
                    return Ok(SessionOutcome::OutOfTicks);
                };
                if tick.ticks_skipped > 0 {
                    tracing::trace!(tick = tick.tick, skipped = tick.ticks_skipped, "frames skipped");
                }
                let state = input.poll();
                for event in session.step(&state) {
                    link.send(event).await?;
                }
                ticks.end_tick();
            }
        }
    }
}
