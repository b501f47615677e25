//! Client side of Chase.
//!
//! [`ClientSession`] is the controller: it mirrors the room from server
//! events and turns local input into outgoing events, without touching the
//! network. [`ClientLink`] speaks the envelope protocol over a
//! [`Connection`](chase_transport::Connection), and [`run_session`] joins
//! the two into a frame loop.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use chase_client::{ClientConfig, ClientLink, ClientSession, ScriptedInput, InputState, run_session};
//! use chase_tick::SyntheticTicks;
//!
//! # async fn demo() -> Result<(), chase_client::ClientError> {
//! let mut link = ClientLink::connect("ws://127.0.0.1:3000").await?;
//! let mut session = ClientSession::new(link.player_id(), &ClientConfig::default());
//! link.create_room("Ada").await?;
//!
//! let mut input = ScriptedInput::hold(InputState::forward(), 600);
//! let mut ticks = SyntheticTicks::new(Duration::from_millis(16), 600);
//! let outcome = run_session(&mut link, &mut session, &mut input, &mut ticks, |effect| {
//!     println!("{effect:?}");
//! })
//! .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod avatar;
mod collision;
mod config;
mod driver;
mod error;
mod input;
mod layout;
mod link;
mod session;

pub use avatar::{Avatar, WAVE_FRAMES, animate};
pub use collision::{Obstacle, World};
pub use config::{ClientConfig, MovementConfig, WorldConfig};
pub use driver::{SessionOutcome, run_session};
pub use error::ClientError;
pub use input::{InputSource, InputState, ScriptedInput};
pub use link::ClientLink;
pub use session::{CAUGHT_NOTICE, ClientSession, RemoteProxy, SessionEffect, SessionPhase};
