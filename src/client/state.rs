// ABOUTME: Session lifecycle states for the bind/unbind state machine
// ABOUTME: Unbound -> Binding -> Bound -> Unbinding -> Unbound, with Error on a rejected bind

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Unbound,
    Binding,
    Bound,
    Unbinding,
    /// Transient: a bind was rejected; the engine moves on to Unbound
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unbound => "unbound",
            SessionState::Binding => "binding",
            SessionState::Bound => "bound",
            SessionState::Unbinding => "unbinding",
            SessionState::Error => "error",
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, SessionState::Bound)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
