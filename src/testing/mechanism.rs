use crate::mechanism::{AcceptStep, CredentialRole, InitStep, MechStatus, Mechanism, StepStatus};
use crate::types::{NegotiatedFlags, Oid, Token};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Major code reported for every injected failure.
const FAILURE: u32 = 0x000d_0000;
/// Major code reported for malformed tokens.
const DEFECTIVE_TOKEN: u32 = 0x0009_0000;

const REQUEST: &str = "rt-req:";
const RESPONSE: &str = "rt-resp:";

/// Per-negotiation state of [`RoundTripMechanism`].
#[derive(Debug)]
pub struct RoundTripContext {
    round: u32,
}

/// Credential issued by [`RoundTripMechanism`].
#[derive(Debug)]
pub struct RoundTripCredential {
    role: CredentialRole,
}

impl RoundTripCredential {
    /// The role the credential was acquired for.
    #[must_use]
    pub const fn role(&self) -> CredentialRole {
        self.role
    }
}

/// Name value of [`RoundTripMechanism`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTripName(String);

/// A mechanism that completes after exactly `k` request/response pairs.
///
/// The initiator sends `rt-req:1`, the acceptor answers `rt-resp:1`, and so
/// on. The acceptor completes when it answers round `k` and reports the
/// configured principal as the peer; the initiator completes, with no
/// output, when it reads `rt-resp:k`.
#[derive(Debug)]
pub struct RoundTripMechanism {
    rounds: u32,
    principal: String,
    fail_init_at: Option<u32>,
    fail_accept_at: Option<u32>,
    fail_credentials: bool,
    live_contexts: AtomicUsize,
    live_names: AtomicUsize,
    live_credentials: AtomicUsize,
    acquisitions: AtomicUsize,
    init_calls: AtomicUsize,
    accept_calls: AtomicUsize,
    last_target: Mutex<Option<String>>,
}

impl RoundTripMechanism {
    /// Creates a mechanism needing `rounds` pairs (at least one).
    #[must_use]
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
            principal: "alice@EXAMPLE.ORG".to_owned(),
            fail_init_at: None,
            fail_accept_at: None,
            fail_credentials: false,
            live_contexts: AtomicUsize::new(0),
            live_names: AtomicUsize::new(0),
            live_credentials: AtomicUsize::new(0),
            acquisitions: AtomicUsize::new(0),
            init_calls: AtomicUsize::new(0),
            accept_calls: AtomicUsize::new(0),
            last_target: Mutex::new(None),
        }
    }

    /// Sets the principal the acceptor reports.
    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = principal.into();
        self
    }

    /// Fails the initiator when it would send request `round`.
    #[must_use]
    pub const fn fail_init_at(mut self, round: u32) -> Self {
        self.fail_init_at = Some(round);
        self
    }

    /// Fails the acceptor when it receives request `round`.
    #[must_use]
    pub const fn fail_accept_at(mut self, round: u32) -> Self {
        self.fail_accept_at = Some(round);
        self
    }

    /// Fails every credential acquisition.
    #[must_use]
    pub const fn fail_credentials(mut self) -> Self {
        self.fail_credentials = true;
        self
    }

    /// Rounds needed to complete.
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Contexts created and not yet released.
    pub fn live_contexts(&self) -> usize {
        self.live_contexts.load(Ordering::SeqCst)
    }

    /// Names created and not yet released.
    pub fn live_names(&self) -> usize {
        self.live_names.load(Ordering::SeqCst)
    }

    /// Credentials acquired and not yet released.
    pub fn live_credentials(&self) -> usize {
        self.live_credentials.load(Ordering::SeqCst)
    }

    /// Successful credential acquisitions so far.
    pub fn credential_acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Calls to [`Mechanism::init`] so far.
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Calls to [`Mechanism::accept`] so far.
    pub fn accept_calls(&self) -> usize {
        self.accept_calls.load(Ordering::SeqCst)
    }

    /// The target name given to the most recent first init call.
    pub fn last_target(&self) -> Option<String> {
        self.last_target.lock().clone()
    }

    fn open_context(&self, context: &mut Option<RoundTripContext>) -> u32 {
        if let Some(ctx) = context.as_ref() {
            return ctx.round;
        }
        self.live_contexts.fetch_add(1, Ordering::SeqCst);
        *context = Some(RoundTripContext { round: 0 });
        0
    }

    fn new_name(&self, text: &str) -> RoundTripName {
        self.live_names.fetch_add(1, Ordering::SeqCst);
        RoundTripName(text.to_owned())
    }
}

fn parse_round(input: &[u8], prefix: &str) -> Result<u32, MechStatus> {
    std::str::from_utf8(input)
        .ok()
        .and_then(|text| text.strip_prefix(prefix))
        .and_then(|round| round.parse().ok())
        .ok_or(MechStatus::new(DEFECTIVE_TOKEN, 0))
}

fn established(requested: NegotiatedFlags) -> NegotiatedFlags {
    requested | NegotiatedFlags::SEQUENCE | NegotiatedFlags::INTEGRITY
}

impl Mechanism for RoundTripMechanism {
    type Context = RoundTripContext;
    type Credential = RoundTripCredential;
    type Name = RoundTripName;

    fn import_name(&self, name: &str) -> Result<Self::Name, MechStatus> {
        if name.is_empty() {
            return Err(MechStatus::new(FAILURE, 0));
        }
        Ok(self.new_name(name))
    }

    fn acquire_credential(
        &self,
        role: CredentialRole,
        _mech: Option<&Oid>,
    ) -> Result<Self::Credential, MechStatus> {
        if self.fail_credentials {
            return Err(MechStatus::new(FAILURE, 1));
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.live_credentials.fetch_add(1, Ordering::SeqCst);
        Ok(RoundTripCredential { role })
    }

    fn init(
        &self,
        context: &mut Option<Self::Context>,
        _credential: Option<&Self::Credential>,
        target: Option<&Self::Name>,
        input: Option<&[u8]>,
        requested: NegotiatedFlags,
    ) -> Result<InitStep, MechStatus> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let sent = self.open_context(context);

        if let Some(input) = input {
            let answered = parse_round(input, RESPONSE)?;
            if answered != sent {
                return Err(MechStatus::new(DEFECTIVE_TOKEN, answered));
            }
            if answered == self.rounds {
                return Ok(InitStep {
                    status: StepStatus::Complete,
                    output: Token::empty(),
                    flags: Some(established(requested)),
                });
            }
        } else if sent == 0 {
            *self.last_target.lock() = target.map(|name| name.0.clone());
        } else {
            return Err(MechStatus::new(DEFECTIVE_TOKEN, sent));
        }

        let next = sent + 1;
        if self.fail_init_at == Some(next) {
            return Err(MechStatus::new(FAILURE, next));
        }
        if let Some(ctx) = context.as_mut() {
            ctx.round = next;
        }
        Ok(InitStep {
            status: StepStatus::ContinueNeeded,
            output: Token::new(format!("{REQUEST}{next}").into_bytes()),
            flags: None,
        })
    }

    fn accept(
        &self,
        context: &mut Option<Self::Context>,
        _credential: Option<&Self::Credential>,
        input: &[u8],
    ) -> Result<AcceptStep<Self::Name>, MechStatus> {
        self.accept_calls.fetch_add(1, Ordering::SeqCst);
        let answered = self.open_context(context);

        let round = parse_round(input, REQUEST)?;
        if round != answered + 1 {
            return Err(MechStatus::new(DEFECTIVE_TOKEN, round));
        }
        if self.fail_accept_at == Some(round) {
            return Err(MechStatus::new(FAILURE, round));
        }
        if let Some(ctx) = context.as_mut() {
            ctx.round = round;
        }

        let output = Token::new(format!("{RESPONSE}{round}").into_bytes());
        if round == self.rounds {
            Ok(AcceptStep {
                status: StepStatus::Complete,
                output,
                peer: Some(self.new_name(&self.principal)),
                flags: Some(established(NegotiatedFlags::REQUESTED)),
            })
        } else {
            Ok(AcceptStep {
                status: StepStatus::ContinueNeeded,
                output,
                peer: None,
                flags: None,
            })
        }
    }

    fn display_name(&self, name: &Self::Name) -> Result<String, MechStatus> {
        Ok(name.0.clone())
    }

    fn release_context(&self, _context: Self::Context) -> Result<(), MechStatus> {
        self.live_contexts.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn release_name(&self, _name: Self::Name) -> Result<(), MechStatus> {
        self.live_names.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn release_credential(&self, _credential: Self::Credential) -> Result<(), MechStatus> {
        self.live_credentials.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe_status(&self, status: &MechStatus) -> Vec<String> {
        let routine = match status.major {
            FAILURE => "injected failure",
            DEFECTIVE_TOKEN => "defective token",
            _ => "unknown",
        };
        vec![format!("round-trip: {routine} (round {})", status.minor)]
    }
}
