//! Role confinement: wrap a function so its body runs only on processes
//! satisfying a role predicate.
//!
//! Workers spend their lives inside the worker loop and never reach
//! arbitrary call sites, but caller code shared across ranks (printing,
//! file writes) can still be wrapped so it no-ops everywhere except the
//! manager. Wrapped functions take a single argument; use a tuple to pass
//! several.

use crate::comm::Rank;
use crate::role::{ProcessRole, RoleAssignment};

/// Confine `f` to the manager process. On any other rank the wrapper
/// returns `None` without touching `f`.
pub fn confine_to<A, R, F>(roles: &RoleAssignment, f: F) -> impl Fn(A) -> Option<R>
where
    F: Fn(A) -> R,
{
    confine_when(roles, roles.predicate_for(ProcessRole::Manager), f)
}

/// Confine `f` to ranks accepted by `predicate`.
pub fn confine_when<A, R, F, P>(roles: &RoleAssignment, predicate: P, f: F) -> impl Fn(A) -> Option<R>
where
    F: Fn(A) -> R,
    P: Fn(Rank) -> bool,
{
    let rank = roles.rank();
    move |args| {
        if predicate(rank) {
            Some(f(args))
        } else {
            None
        }
    }
}

/// Confine `f` to ranks accepted by `predicate`, running `otherwise` as a
/// substitute everywhere else.
pub fn confine_when_or<A, R, F, G, P>(
    roles: &RoleAssignment,
    predicate: P,
    f: F,
    otherwise: G,
) -> impl Fn(A) -> R
where
    F: Fn(A) -> R,
    G: Fn(A) -> R,
    P: Fn(Rank) -> bool,
{
    let rank = roles.rank();
    move |args| {
        if predicate(rank) {
            f(args)
        } else {
            otherwise(args)
        }
    }
}
