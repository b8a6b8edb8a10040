//! Phase router.
//!
//! The order lifecycle decides which leg of the journey is active. This
//! module maps that phase, plus the points known so far, to the endpoint
//! pair the session should route between.
//!
//! | Phase           | Origin                              | Destination         |
//! |-----------------|-------------------------------------|---------------------|
//! | `ToOrigin`      | agent position, else journey start  | journey origin      |
//! | `AtOrigin`      | journey origin                      | journey destination |
//! | `ToDestination` | agent position, else journey origin | journey destination |
//! | `Unassigned`    | nothing is rendered                 |                     |
//! | `Completed`     | nothing is rendered                 |                     |

mod router;
mod types;

pub use router::{select_endpoints, EndpointChange, PhaseRouter};
pub use types::{Endpoints, KnownPoints, Phase, PhaseParseError};
