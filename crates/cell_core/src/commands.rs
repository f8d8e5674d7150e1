//! Commands sent from the control thread to the audio thread.
//!
//! Patch changes travel through a bounded `rtrb` queue and are applied at the
//! top of the next tick, before the rack runs, so a tick always sees one
//! consistent routing.

use serde::{Deserialize, Serialize};

use crate::patch::Socket;

/// Default capacity of the patch command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchCommand {
    /// Alias `sink` to the cell `source` publishes.
    Connect { source: Socket, sink: Socket },
    /// Point `sink` back at the sentinel.
    Disconnect { sink: Socket },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_with_socket_names() {
        let cmd = PatchCommand::Connect {
            source: Socket::LfoAOutA,
            sink: Socket::VcoAInFm,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(
            json,
            r#"{"op":"connect","source":"lfo_a_out_a","sink":"vco_a_in_fm"}"#
        );

        let back: PatchCommand =
            serde_json::from_str(r#"{"op":"disconnect","sink":"mix_in_l"}"#).unwrap();
        assert_eq!(
            back,
            PatchCommand::Disconnect {
                sink: Socket::MixInL
            }
        );
    }
}
