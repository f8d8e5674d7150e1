//! The patch bay: the fixed table of named sockets.
//!
//! A sink socket names one port slot of one module (the cell handle that
//! module reads). A source socket names one output cell. Patching a cable
//! rewrites the sink's handle to the source cell; nothing is copied and no
//! buffer sits in between.

use serde::{Deserialize, Serialize};

use crate::cell::CellId;
use crate::error::PatchError;
use crate::rack::RackSlot;
use crate::types::{Indexed, PortGroup};

/// Every jack on the panel. Sinks come first, then sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Indexed)]
#[serde(rename_all = "snake_case")]
pub enum Socket {
    // VCO
    VcoAInFm,
    VcoBInFm,
    VcoCInFm,
    VcoDInFm,
    VcoAInPw,
    VcoBInPw,
    VcoCInPw,
    VcoDInPw,
    VcoAInSh,
    VcoBInSh,
    VcoCInSh,
    VcoDInSh,
    VcoAInAm,
    VcoBInAm,
    VcoCInAm,
    VcoDInAm,
    VcoAInEc,
    VcoBInEc,
    VcoCInEc,
    VcoDInEc,
    // delay
    VcdInA,
    VcdInB,
    VcdInC,
    VcdInD,
    VcdInTime,
    VcdInFeed,
    // VCF
    VcfAInA,
    VcfBInA,
    VcfAInB,
    VcfBInB,
    VcfAInC,
    VcfBInC,
    VcfACutIn,
    VcfBCutIn,
    #[indexed(name = "vcf_a_q_in")]
    VcfAQIn,
    #[indexed(name = "vcf_b_q_in")]
    VcfBQIn,
    // VCA
    VcaAInA,
    VcaBInA,
    VcaAInB,
    VcaBInB,
    VcaAInCv,
    VcaBInCv,
    // rotor
    LcrCvL,
    LcrCvC,
    LcrCvR,
    #[indexed(name = "lcr_in_l_a")]
    LcrInLA,
    #[indexed(name = "lcr_in_c_a")]
    LcrInCA,
    #[indexed(name = "lcr_in_r_a")]
    LcrInRA,
    #[indexed(name = "lcr_in_l_b")]
    LcrInLB,
    #[indexed(name = "lcr_in_c_b")]
    LcrInCB,
    #[indexed(name = "lcr_in_r_b")]
    LcrInRB,
    // mixer
    MixLcCv,
    MixCrCv,
    MixInL,
    MixInC,
    MixInR,
    // sum and product
    SumAInA,
    SumAInB,
    SumBInA,
    SumBInB,
    PctInA,
    PctInB,
    PctInC,
    // chaos
    ChsAInWm,
    ChsBInWm,
    ChsAInEc,
    ChsBInEc,
    // sample and hold
    SnhAInA,
    SnhAInB,
    SnhBInA,
    SnhBInB,
    SnhATime,
    SnhBTime,
    // LFO
    LfoAInFreq,
    LfoBInFreq,
    LfoAInAm,
    LfoBInAm,

    // Sources
    SumAOutA,
    SumAOutB,
    SumBOutA,
    SumBOutB,
    PctOutA,
    VcoAOut,
    VcoBOut,
    VcoCOut,
    VcoDOut,
    EnvAOut,
    EnvBOut,
    EnvCOut,
    EnvDOut,
    ChsAOutX,
    ChsAOutY,
    ChsAOutZ,
    ChsBOutX,
    ChsBOutY,
    ChsBOutZ,
    VcfAOutLp,
    VcfAOutBp,
    VcfAOutHp,
    VcfBOutLp,
    VcfBOutBp,
    VcfBOutHp,
    VcaAOutA,
    VcaBOutA,
    VcaAOutB,
    VcaBOutB,
    #[indexed(name = "lcr_out_l_a")]
    LcrOutLA,
    #[indexed(name = "lcr_out_c_a")]
    LcrOutCA,
    #[indexed(name = "lcr_out_r_a")]
    LcrOutRA,
    #[indexed(name = "lcr_out_l_b")]
    LcrOutLB,
    #[indexed(name = "lcr_out_c_b")]
    LcrOutCB,
    #[indexed(name = "lcr_out_r_b")]
    LcrOutRB,
    SnhAOut,
    SnhBOut,
    LfoAOutA,
    LfoAOutB,
    LfoBOutA,
    LfoBOutB,
    VcdOutA,
    VcdOutB,
    VcdOutC,
    VcdOutD,
}

impl Socket {
    pub const FIRST_SOURCE: Socket = Socket::SumAOutA;

    pub fn is_source(self) -> bool {
        self.index() >= Self::FIRST_SOURCE.index()
    }

    pub fn is_sink(self) -> bool {
        !self.is_source()
    }

    pub fn sinks() -> impl Iterator<Item = Socket> {
        Self::ALL.iter().copied().filter(|s| s.is_sink())
    }

    pub fn sources() -> impl Iterator<Item = Socket> {
        Self::ALL.iter().copied().filter(|s| s.is_source())
    }
}

/// The module a sink belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Rack(RackSlot),
    Sum(u8),
    Product,
    Mixer,
}

/// One port slot of one module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Jack {
    pub owner: Owner,
    pub group: PortGroup,
    pub index: u8,
}

impl Jack {
    pub fn input<E: Indexed>(owner: Owner, port: E) -> Self {
        Self {
            owner,
            group: PortGroup::Input,
            index: port.index() as u8,
        }
    }
}

/// A patched connection, as listed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cable {
    pub source: Socket,
    pub sink: Socket,
}

impl Cable {
    /// Parse `source:sink` using socket names.
    pub fn parse(text: &str) -> Result<Self, PatchError> {
        let (source, sink) = text
            .split_once(':')
            .ok_or_else(|| PatchError::UnknownSocket(text.to_string()))?;
        let lookup = |name: &str| {
            Socket::from_name(name.trim()).ok_or_else(|| PatchError::UnknownSocket(name.to_string()))
        };
        Ok(Self {
            source: lookup(source)?,
            sink: lookup(sink)?,
        })
    }
}

/// Socket bindings plus the record of which source currently feeds each sink.
#[derive(Debug)]
pub struct PatchBay {
    sinks: Vec<Option<Jack>>,
    sources: Vec<Option<CellId>>,
    patched: Vec<Option<Socket>>,
}

impl PatchBay {
    pub fn new() -> Self {
        Self {
            sinks: vec![None; Socket::COUNT],
            sources: vec![None; Socket::COUNT],
            patched: vec![None; Socket::COUNT],
        }
    }

    pub fn bind_sink(&mut self, socket: Socket, jack: Jack) {
        debug_assert!(socket.is_sink(), "{} is not a sink", socket.name());
        self.sinks[socket.index()] = Some(jack);
    }

    pub fn bind_source(&mut self, socket: Socket, cell: CellId) {
        debug_assert!(socket.is_source(), "{} is not a source", socket.name());
        self.sources[socket.index()] = Some(cell);
    }

    pub fn sink(&self, socket: Socket) -> Option<Jack> {
        self.sinks[socket.index()]
    }

    pub fn source(&self, socket: Socket) -> Option<CellId> {
        self.sources[socket.index()]
    }

    /// Resolve a cable to the cell it reads and the port slot it rewrites.
    pub fn route(&self, source: Socket, sink: Socket) -> Result<(CellId, Jack), PatchError> {
        let cell = self.source(source).ok_or(PatchError::NotASource(source))?;
        let jack = self.sink(sink).ok_or(PatchError::NotASink(sink))?;
        Ok((cell, jack))
    }

    pub fn record(&mut self, sink: Socket, source: Option<Socket>) {
        self.patched[sink.index()] = source;
    }

    /// Which source currently feeds `sink`, if any.
    pub fn patched_from(&self, sink: Socket) -> Option<Socket> {
        self.patched[sink.index()]
    }

    pub fn cables(&self) -> impl Iterator<Item = Cable> + '_ {
        Socket::ALL
            .iter()
            .zip(self.patched.iter())
            .filter_map(|(sink, source)| {
                source.map(|source| Cable {
                    source,
                    sink: *sink,
                })
            })
    }

    /// Number of sinks and sources bound.
    pub fn bound(&self) -> (usize, usize) {
        (
            self.sinks.iter().filter(|j| j.is_some()).count(),
            self.sources.iter().filter(|c| c.is_some()).count(),
        )
    }
}

impl Default for PatchBay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellAllocator;

    #[test]
    fn socket_table_has_fixed_shape() {
        assert_eq!(Socket::COUNT, 122);
        assert_eq!(Socket::sinks().count(), 77);
        assert_eq!(Socket::sources().count(), 45);
    }

    #[test]
    fn socket_names_follow_panel_labels() {
        assert_eq!(Socket::VcoAInFm.name(), "vco_a_in_fm");
        assert_eq!(Socket::VcfBQIn.name(), "vcf_b_q_in");
        assert_eq!(Socket::LcrInRB.name(), "lcr_in_r_b");
        assert_eq!(Socket::LcrOutLA.name(), "lcr_out_l_a");
        assert_eq!(Socket::ChsAOutX.name(), "chs_a_out_x");
        assert_eq!(Socket::EnvDOut.name(), "env_d_out");
        assert_eq!(Socket::from_name("pct_out_a"), Some(Socket::PctOutA));
    }

    #[test]
    fn serde_names_match_indexed_names() {
        for socket in Socket::ALL {
            let json = serde_json::to_string(socket).unwrap();
            assert_eq!(json, format!("\"{}\"", socket.name()));
        }
    }

    #[test]
    fn cable_parses_socket_names() {
        let cable = Cable::parse("chs_a_out_x:sum_a_in_a").unwrap();
        assert_eq!(cable.source, Socket::ChsAOutX);
        assert_eq!(cable.sink, Socket::SumAInA);

        assert!(matches!(
            Cable::parse("chs_a_out_x"),
            Err(PatchError::UnknownSocket(_))
        ));
        assert!(matches!(
            Cable::parse("chs_a_out_x:nowhere"),
            Err(PatchError::UnknownSocket(name)) if name == "nowhere"
        ));
    }

    #[test]
    fn route_checks_socket_roles() {
        let mut alloc = CellAllocator::new();
        let cell = alloc.alloc(0.0);
        let mut bay = PatchBay::new();
        let jack = Jack {
            owner: Owner::Product,
            group: PortGroup::Input,
            index: 0,
        };
        bay.bind_source(Socket::ChsAOutX, cell);
        bay.bind_sink(Socket::PctInA, jack);

        assert_eq!(bay.route(Socket::ChsAOutX, Socket::PctInA).unwrap(), (cell, jack));
        assert!(matches!(
            bay.route(Socket::PctInA, Socket::PctInA),
            Err(PatchError::NotASource(Socket::PctInA))
        ));
        assert!(matches!(
            bay.route(Socket::ChsAOutX, Socket::ChsAOutX),
            Err(PatchError::NotASink(Socket::ChsAOutX))
        ));
    }

    #[test]
    fn cables_lists_recorded_routes() {
        let mut bay = PatchBay::new();
        bay.record(Socket::MixInL, Some(Socket::VcoAOut));
        bay.record(Socket::MixInR, Some(Socket::VcoBOut));
        bay.record(Socket::MixInR, None);

        let cables: Vec<Cable> = bay.cables().collect();
        assert_eq!(
            cables,
            vec![Cable {
                source: Socket::VcoAOut,
                sink: Socket::MixInL
            }]
        );
    }
}
