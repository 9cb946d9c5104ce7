//! Reading the balance: select the application, read the value file settings, then the value.

use crate::card::{Card, MAX_FRAMES};
use crate::directory::ApplicationId;
use crate::error::Error;
use crate::nfc::Transport;
use crate::settings::ValueFileSettings;
use crate::value::Balance;

/// Application of the canteen card read by default.
pub const DEFAULT_APPLICATION_ID: ApplicationId = ApplicationId::new(0x5F8415);

/// Value file read by default.
pub const DEFAULT_FILE_NO: u8 = 1;

/// Parameters of a session
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub application_id: ApplicationId,
    pub file_no: u8,

    /// Frames accepted in a chained response, at most `MAX_FRAMES`.
    pub max_frames: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            application_id: DEFAULT_APPLICATION_ID,
            file_no: DEFAULT_FILE_NO,
            max_frames: MAX_FRAMES,
        }
    }
}

/// Reason a session failed
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed while selecting the application: {0}")]
    SelectApplication(#[source] Error),

    #[error("Failed while reading the file settings: {0}")]
    SettingsRead(#[source] Error),

    #[error("Failed while reading the value: {0}")]
    ValueRead(#[source] Error),

    #[error("The session was cancelled")]
    Cancelled,
}

impl SessionError {
    fn at(state: &State, e: Error) -> Self {
        match (state, e) {
            (_, Error::Cancelled) => Self::Cancelled,
            (State::Idle, e) => Self::SelectApplication(e),
            (State::AppSelected, e) => Self::SettingsRead(e),
            (_, e) => Self::ValueRead(e),
        }
    }
}

/// State of a session
#[derive(Debug)]
pub enum State {
    Idle,
    AppSelected,
    SettingsRead(ValueFileSettings),
    ValueRead {
        settings: ValueFileSettings,
        value: i32,
    },
    Done(Balance),
    Failed(SessionError),
}

impl State {
    /// Determines whether no more steps can be taken.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AppSelected => "AppSelected",
            Self::SettingsRead(_) => "SettingsRead",
            Self::ValueRead { .. } => "ValueRead",
            Self::Done(_) => "Done",
            Self::Failed(_) => "Failed",
        }
    }
}

/// A single balance read against one tag.
/// Commands are issued one at a time; the delegate is invalidated exactly once when the
/// session reaches `Done` or `Failed`.
pub struct Session<T, Ctx>
where
    T: Transport<Ctx>,
    Ctx: Copy,
{
    card: Card<T, Ctx>,
    config: SessionConfig,
    state: State,
}

impl<T, Ctx> Session<T, Ctx>
where
    T: Transport<Ctx>,
    Ctx: Copy,
{
    /// Initiates a session with the delegate.
    pub fn new(delegate: Box<T>, config: SessionConfig) -> Self {
        Self {
            card: Card::new(delegate).with_max_frames(config.max_frames),
            config,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Takes one transition. Does nothing once the session is terminal.
    pub fn step(&mut self, ctx: Ctx) -> &State {
        if self.state.is_terminal() {
            return &self.state;
        }

        let state = std::mem::replace(&mut self.state, State::Idle);
        let next = match self.advance(ctx, &state) {
            Ok(next) => next,
            Err(e) => State::Failed(SessionError::at(&state, e)),
        };

        debug!("Session: {} -> {}", state.name(), next.name());
        self.state = next;

        match &self.state {
            State::Done(_) => self.card.invalidate(ctx, None),
            State::Failed(e) => self.card.invalidate(ctx, Some(&e.to_string())),
            _ => {}
        }

        &self.state
    }

    /// Runs the session to the end, returning the balance.
    pub fn run(mut self, ctx: Ctx) -> Result<Balance, SessionError> {
        while !self.step(ctx).is_terminal() {}

        match self.state {
            State::Done(balance) => {
                info!("Read balance {} (last {})", balance.value, balance.last_transaction);

                Ok(balance)
            }
            State::Failed(e) => Err(e),
            _ => unreachable!("the session stopped before a terminal state"),
        }
    }

    fn advance(&self, ctx: Ctx, state: &State) -> Result<State, Error> {
        let SessionConfig {
            application_id,
            file_no,
            ..
        } = self.config;

        Ok(match state {
            State::Idle => {
                self.card.select_application(ctx, application_id)?;
                State::AppSelected
            }
            State::AppSelected => State::SettingsRead(self.card.value_file_settings(ctx, file_no)?),
            State::SettingsRead(settings) => State::ValueRead {
                settings: settings.clone(),
                value: self.card.read_value(ctx, file_no)?,
            },
            State::ValueRead { settings, value } => State::Done(Balance::new(*value, settings)),
            State::Done(_) | State::Failed(_) => unreachable!("terminal states do not advance"),
        })
    }
}
