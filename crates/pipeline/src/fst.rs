//! Arc-sorted finite-state transducers
//!
//! Decoding graphs are immutable directed multigraphs stored in CSR form:
//! `states[s].arcs_offset` indexes into a flat, per-state ilabel-sorted arc
//! array, with one sentinel state at the end so every state's arc range is
//! `states[s] .. states[s+1]`. The single-start/single-final convention is
//! enforced on load: state 0 starts, state `num_states - 1` accepts.
//!
//! Two codecs are supported: a tagged little-endian binary format for
//! production graphs and a line-oriented text format for authoring and tests.

use std::io::{BufRead, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::stt::Tokenizer;
use trellis_core::{Error, Result};

pub type FstStateId = i32;
pub type FstLabel = i32;
pub type FstScore = f32;

/// Epsilon input label. Smallest representable label so that epsilon arcs
/// sort first within a state, making the epsilon probe O(1).
pub const EPSILON: FstLabel = FstLabel::MIN;

/// End-of-input label, marking arcs taken when the utterance finishes.
pub const INPUT_END: FstLabel = -1;

/// Upper bound on `num_states`/`num_arcs` accepted from untrusted streams.
const MAX_REASONABLE_COUNT: i64 = 1 << 32;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FstArc {
    pub src: FstStateId,
    pub dst: FstStateId,
    pub ilabel: FstLabel,
    pub olabel: FstLabel,
    pub score: FstScore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FstState {
    pub arcs_offset: i32,
}

/// Immutable arc-sorted transducer.
#[derive(Debug, Default, PartialEq)]
pub struct Fst {
    // i64 instead of usize for platform-independent binaries
    pub num_states: i64,
    pub num_arcs: i64,

    pub start_state: FstStateId,
    pub final_state: FstStateId,

    /// One extra sentinel entry: `states.len() == num_states + 1`.
    pub states: Vec<FstState>,
    pub arcs: Vec<FstArc>,
}

impl Fst {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// O(1) probe: epsilon is the smallest label, so a state has an epsilon
    /// arc iff its first arc carries one.
    #[inline]
    pub fn contains_epsilon_arc(&self, s: FstStateId) -> bool {
        let lo = self.states[s as usize].arcs_offset as usize;
        let hi = self.states[s as usize + 1].arcs_offset as usize;
        lo < hi && self.arcs[lo].ilabel == EPSILON
    }

    /// All arcs leaving `s`, in stored (ilabel-sorted) order.
    /// The sentinel state must not be queried.
    #[inline]
    pub fn arcs(&self, s: FstStateId) -> &[FstArc] {
        debug_assert!(!self.is_empty());
        debug_assert!((s as usize) < self.states.len() - 1);
        let lo = self.states[s as usize].arcs_offset as usize;
        let hi = self.states[s as usize + 1].arcs_offset as usize;
        &self.arcs[lo..hi]
    }

    /// Load from the tagged binary format.
    pub fn load(&mut self, r: &mut impl Read) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::PreconditionFailed(
                "cannot load into a non-empty graph".to_string(),
            ));
        }

        expect_tag(r, "<Fsm>")?;

        expect_tag(r, "<NumStates>")?;
        self.num_states = r.read_i64::<LittleEndian>()?;

        expect_tag(r, "<NumArcs>")?;
        self.num_arcs = r.read_i64::<LittleEndian>()?;

        if self.num_states <= 0 || self.num_states > MAX_REASONABLE_COUNT {
            return Err(Error::MalformedGraph(format!(
                "implausible state count: {}",
                self.num_states
            )));
        }
        if self.num_arcs < 0 || self.num_arcs > MAX_REASONABLE_COUNT {
            return Err(Error::MalformedGraph(format!(
                "implausible arc count: {}",
                self.num_arcs
            )));
        }

        expect_tag(r, "<StartState>")?;
        self.start_state = r.read_i32::<LittleEndian>()?;

        expect_tag(r, "<FinalState>")?;
        self.final_state = r.read_i32::<LittleEndian>()?;

        expect_tag(r, "<States>")?;
        let num_states_plus_sentinel = (self.num_states + 1) as usize;
        self.states.reserve_exact(num_states_plus_sentinel);
        for _ in 0..num_states_plus_sentinel {
            self.states.push(FstState {
                arcs_offset: r.read_i32::<LittleEndian>()?,
            });
        }

        expect_tag(r, "<Arcs>")?;
        self.arcs.reserve_exact(self.num_arcs as usize);
        for _ in 0..self.num_arcs {
            self.arcs.push(FstArc {
                src: r.read_i32::<LittleEndian>()?,
                dst: r.read_i32::<LittleEndian>()?,
                ilabel: r.read_i32::<LittleEndian>()?,
                olabel: r.read_i32::<LittleEndian>()?,
                score: r.read_f32::<LittleEndian>()?,
            });
        }

        self.check_structure()
    }

    /// Dump to the tagged binary format. `dump(load(x)) == x` byte for byte.
    pub fn dump(&self, w: &mut impl Write) -> Result<()> {
        if self.is_empty() {
            return Err(Error::PreconditionFailed(
                "cannot dump an empty graph".to_string(),
            ));
        }

        write_tag(w, "<Fsm>")?;

        write_tag(w, "<NumStates>")?;
        w.write_i64::<LittleEndian>(self.num_states)?;

        write_tag(w, "<NumArcs>")?;
        w.write_i64::<LittleEndian>(self.num_arcs)?;

        write_tag(w, "<StartState>")?;
        w.write_i32::<LittleEndian>(self.start_state)?;

        write_tag(w, "<FinalState>")?;
        w.write_i32::<LittleEndian>(self.final_state)?;

        write_tag(w, "<States>")?;
        for state in &self.states {
            w.write_i32::<LittleEndian>(state.arcs_offset)?;
        }

        write_tag(w, "<Arcs>")?;
        for arc in &self.arcs {
            w.write_i32::<LittleEndian>(arc.src)?;
            w.write_i32::<LittleEndian>(arc.dst)?;
            w.write_i32::<LittleEndian>(arc.ilabel)?;
            w.write_i32::<LittleEndian>(arc.olabel)?;
            w.write_f32::<LittleEndian>(arc.score)?;
        }

        Ok(())
    }

    /// Load from the line-oriented text format:
    ///
    /// ```text
    /// num_states,num_arcs,start_state,final_state
    /// src <tab> dst <tab> ilabel[:olabel]/score
    /// ```
    ///
    /// A single label means acceptor semantics (`olabel = ilabel`). Arcs may
    /// appear in any order; they are re-sorted by `(src, ilabel)` and the
    /// state offsets are rebuilt afterwards.
    pub fn load_text(&mut self, r: impl BufRead) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::PreconditionFailed(
                "cannot load into a non-empty graph".to_string(),
            ));
        }
        tracing::info!("loading graph from text stream");

        let mut lines = r.lines();

        let header = lines
            .next()
            .ok_or_else(|| Error::MalformedGraph("missing header line".to_string()))??;
        {
            let cols: Vec<&str> = header
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            if cols.len() != 4 {
                return Err(Error::MalformedGraph(format!(
                    "header needs 4 comma-separated fields, got {}",
                    cols.len()
                )));
            }
            self.num_states = parse_num(cols[0])?;
            self.num_arcs = parse_num(cols[1])?;
            self.start_state = parse_num(cols[2])? as FstStateId;
            self.final_state = parse_num(cols[3])? as FstStateId;
        }

        if self.num_states <= 0 {
            return Err(Error::MalformedGraph("graph has no states".to_string()));
        }
        if self.start_state != 0 {
            return Err(Error::MalformedGraph(format!(
                "start state must be 0, got {}",
                self.start_state
            )));
        }
        if self.final_state as i64 != self.num_states - 1 {
            return Err(Error::MalformedGraph(format!(
                "final state must be {}, got {}",
                self.num_states - 1,
                self.final_state
            )));
        }

        let mut n: i64 = 0;
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() != 3 {
                return Err(Error::MalformedGraph(format!(
                    "arc line needs 3 fields, got {}: {:?}",
                    cols.len(),
                    line
                )));
            }

            let arc_info: Vec<&str> = cols[2].split('/').collect();
            if arc_info.len() != 2 {
                return Err(Error::MalformedGraph(format!(
                    "arc info needs labels/score, got {:?}",
                    cols[2]
                )));
            }

            let labels: Vec<&str> = arc_info[0].split(':').collect();
            // 1 label: acceptor, 2 labels: transducer
            if labels.is_empty() || labels.len() > 2 {
                return Err(Error::MalformedGraph(format!(
                    "label spec needs 1 or 2 fields, got {:?}",
                    arc_info[0]
                )));
            }

            let src = parse_num(cols[0])? as FstStateId;
            let dst = parse_num(cols[1])? as FstStateId;
            let ilabel = parse_num(labels[0])? as FstLabel;
            let olabel = if labels.len() == 2 {
                parse_num(labels[1])? as FstLabel
            } else {
                ilabel
            };
            let score: FstScore = arc_info[1]
                .parse()
                .map_err(|_| Error::MalformedGraph(format!("bad score: {:?}", arc_info[1])))?;

            if !(0..self.num_states).contains(&(src as i64))
                || !(0..self.num_states).contains(&(dst as i64))
            {
                return Err(Error::MalformedGraph(format!(
                    "arc endpoint out of range: {} -> {}",
                    src, dst
                )));
            }

            self.add_arc(src, dst, ilabel, olabel, score);
            n += 1;
        }

        if n != self.num_arcs {
            return Err(Error::MalformedGraph(format!(
                "header promises {} arcs, stream carries {}",
                self.num_arcs, n
            )));
        }

        self.index_arcs();
        Ok(())
    }

    /// Dump to the text format, arcs in stored order.
    pub fn dump_text(&self, w: &mut impl Write) -> Result<()> {
        if self.is_empty() {
            return Err(Error::PreconditionFailed(
                "cannot dump an empty graph".to_string(),
            ));
        }

        writeln!(
            w,
            "{},{},{},{}",
            self.num_states, self.num_arcs, self.start_state, self.final_state
        )?;

        for s in 0..self.num_states as FstStateId {
            for arc in self.arcs(s) {
                writeln!(
                    w,
                    "{}\t{}\t{}:{}/{}",
                    arc.src, arc.dst, arc.ilabel, arc.olabel, arc.score
                )?;
            }
        }

        Ok(())
    }

    /// Build the token topology T from a subword tokenizer.
    ///
    /// State 0 carries a blank self-loop; each normal token gets a dedicated
    /// state with enter / self-loop / leave arcs; one `(INPUT_END, eos)` arc
    /// leads to the final state.
    pub fn build_token_topology(&mut self, tokenizer: &Tokenizer) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::PreconditionFailed(
                "cannot build into a non-empty graph".to_string(),
            ));
        }
        if tokenizer.size() == 0 {
            return Err(Error::InvalidArgument("tokenizer is empty".to_string()));
        }
        tracing::info!(size = tokenizer.size(), "building token graph T from tokenizer");

        self.start_state = 0;
        self.add_arc(0, 0, tokenizer.blk, EPSILON, 0.0);

        // state 0 is taken by the start state
        let mut cur_state: FstStateId = 1;
        for t in 0..tokenizer.size() as FstLabel {
            if t == tokenizer.blk || t == tokenizer.unk || t == tokenizer.bos || t == tokenizer.eos
            {
                continue;
            }
            self.add_arc(0, cur_state, t, t, 0.0); // entering
            self.add_arc(cur_state, cur_state, t, EPSILON, 0.0); // self-loop
            self.add_arc(cur_state, 0, EPSILON, EPSILON, 0.0); // leaving
            cur_state += 1;
        }

        self.final_state = cur_state;
        self.add_arc(0, self.final_state, INPUT_END, tokenizer.eos, 0.0);

        self.num_states = self.final_state as i64 + 1;
        self.num_arcs = self.arcs.len() as i64;
        self.index_arcs();
        Ok(())
    }

    fn add_arc(
        &mut self,
        src: FstStateId,
        dst: FstStateId,
        ilabel: FstLabel,
        olabel: FstLabel,
        score: FstScore,
    ) {
        self.arcs.push(FstArc {
            src,
            dst,
            ilabel,
            olabel,
            score,
        });
    }

    /// Sort arcs by `(src, ilabel)` and rebuild the state offsets from the
    /// out-degree prefix sum. The sentinel receives the total arc count.
    fn index_arcs(&mut self) {
        self.arcs.sort_by_key(|a| (a.src, a.ilabel));

        let n = self.num_states as usize;
        self.states = vec![FstState::default(); n + 1];

        let mut out_degree = vec![0i32; n];
        for arc in &self.arcs {
            out_degree[arc.src as usize] += 1;
        }

        // invariant: offset of state s is the arc count of states [0, s)
        let mut acc = 0i32;
        for s in 0..n {
            self.states[s].arcs_offset = acc;
            acc += out_degree[s];
        }
        self.states[n].arcs_offset = acc;
    }

    /// Structural checks applied after a binary load, where the stream is
    /// trusted neither for conventions nor for arc ordering.
    fn check_structure(&self) -> Result<()> {
        if self.start_state != 0 {
            return Err(Error::MalformedGraph(format!(
                "start state must be 0, got {}",
                self.start_state
            )));
        }
        if self.final_state as i64 != self.num_states - 1 {
            return Err(Error::MalformedGraph(format!(
                "final state must be {}, got {}",
                self.num_states - 1,
                self.final_state
            )));
        }
        if self.states.len() != (self.num_states + 1) as usize {
            return Err(Error::MalformedGraph("state table size mismatch".to_string()));
        }
        if self.states[self.num_states as usize].arcs_offset as i64 != self.num_arcs {
            return Err(Error::MalformedGraph(
                "sentinel offset disagrees with arc count".to_string(),
            ));
        }

        for s in 0..self.num_states as usize {
            let lo = self.states[s].arcs_offset;
            let hi = self.states[s + 1].arcs_offset;
            if lo < 0 || lo > hi || hi as i64 > self.num_arcs {
                return Err(Error::MalformedGraph(format!(
                    "state {} has inconsistent arc range [{}, {})",
                    s, lo, hi
                )));
            }
            let arcs = &self.arcs[lo as usize..hi as usize];
            for pair in arcs.windows(2) {
                if pair[0].ilabel > pair[1].ilabel {
                    return Err(Error::MalformedGraph(format!(
                        "arcs of state {} are not sorted by input label",
                        s
                    )));
                }
            }
            for arc in arcs {
                if arc.src != s as FstStateId {
                    return Err(Error::MalformedGraph(format!(
                        "arc filed under state {} claims source {}",
                        s, arc.src
                    )));
                }
                if !(0..self.num_states).contains(&(arc.dst as i64)) {
                    return Err(Error::MalformedGraph(format!(
                        "arc destination out of range: {}",
                        arc.dst
                    )));
                }
            }
        }

        Ok(())
    }
}

fn parse_num(field: &str) -> Result<i64> {
    field
        .parse()
        .map_err(|_| Error::MalformedGraph(format!("bad number: {:?}", field)))
}

/// Length-prefixed ASCII tag: u32 little-endian byte count, then the bytes.
fn write_tag(w: &mut impl Write, tag: &str) -> Result<()> {
    w.write_u32::<LittleEndian>(tag.len() as u32)?;
    w.write_all(tag.as_bytes())?;
    Ok(())
}

fn expect_tag(r: &mut impl Read, tag: &str) -> Result<()> {
    let len = r.read_u32::<LittleEndian>()? as usize;
    if len != tag.len() {
        return Err(Error::MalformedGraph(format!("expected tag {}", tag)));
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    if buf != tag.as_bytes() {
        return Err(Error::MalformedGraph(format!(
            "expected tag {}, got {:?}",
            tag,
            String::from_utf8_lossy(&buf)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn test_tokenizer() -> Tokenizer {
        Tokenizer::from_tokens(vec![
            "<blk>".to_string(),
            "<unk>".to_string(),
            "<s>".to_string(),
            "</s>".to_string(),
            "a".to_string(),
            "b".to_string(),
        ])
    }

    /// Text rendition of the token topology over {blk, unk, bos, eos, a, b}.
    fn token_topo_text() -> String {
        let e = EPSILON;
        format!(
            "4,8,0,3\n\
             0\t0\t0:{e}/0\n\
             0\t1\t4:4/0\n\
             1\t1\t4:{e}/0\n\
             1\t0\t{e}:{e}/0\n\
             0\t2\t5:5/0\n\
             2\t2\t5:{e}/0\n\
             2\t0\t{e}:{e}/0\n\
             0\t3\t{}:3/0\n",
            INPUT_END
        )
    }

    #[test]
    fn test_load_text_sorts_arcs_and_builds_offsets() {
        let mut fst = Fst::new();
        fst.load_text(BufReader::new(Cursor::new(token_topo_text())))
            .unwrap();

        assert_eq!(fst.num_states, 4);
        assert_eq!(fst.num_arcs, 8);
        assert_eq!(fst.states[fst.num_states as usize].arcs_offset, 8);

        for s in 0..fst.num_states as FstStateId {
            let arcs = fst.arcs(s);
            for pair in arcs.windows(2) {
                assert!(pair[0].ilabel <= pair[1].ilabel);
            }
        }

        // epsilon sorts first: INPUT_END (-1) comes after EPSILON, before blk
        assert_eq!(fst.arcs(0)[0].ilabel, INPUT_END);
        assert!(!fst.contains_epsilon_arc(0));
        assert!(fst.contains_epsilon_arc(1));
        assert!(fst.contains_epsilon_arc(2));
        assert!(!fst.contains_epsilon_arc(3));
    }

    #[test]
    fn test_binary_round_trip() {
        let mut fst = Fst::new();
        fst.load_text(BufReader::new(Cursor::new(token_topo_text())))
            .unwrap();

        let mut bytes = Vec::new();
        fst.dump(&mut bytes).unwrap();

        let mut fst2 = Fst::new();
        fst2.load(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(fst2.num_states, 4);
        assert_eq!(fst2.num_arcs, 8);
        assert_eq!(fst2.start_state, 0);
        assert_eq!(fst2.final_state, 3);
        assert_eq!(fst, fst2);

        // dump -> load -> dump is byte-identical
        let mut bytes2 = Vec::new();
        fst2.dump(&mut bytes2).unwrap();
        assert_eq!(bytes, bytes2);
    }

    #[test]
    fn test_build_token_topology_shape() {
        let tokenizer = test_tokenizer();
        let mut fst = Fst::new();
        fst.build_token_topology(&tokenizer).unwrap();

        assert_eq!(fst.num_states, 4);
        assert_eq!(fst.num_arcs, 8);
        assert_eq!(fst.start_state, 0);
        assert_eq!(fst.final_state, 3);

        // matches the hand-written text rendition exactly
        let mut reference = Fst::new();
        reference
            .load_text(BufReader::new(Cursor::new(token_topo_text())))
            .unwrap();
        assert_eq!(fst, reference);
    }

    #[test]
    fn test_build_rejects_non_empty_and_empty_tokenizer() {
        let tokenizer = test_tokenizer();
        let mut fst = Fst::new();
        fst.build_token_topology(&tokenizer).unwrap();
        assert!(matches!(
            fst.build_token_topology(&tokenizer),
            Err(Error::PreconditionFailed(_))
        ));

        let empty = Tokenizer::from_tokens(Vec::new());
        let mut fst2 = Fst::new();
        assert!(matches!(
            fst2.build_token_topology(&empty),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_text_to_binary_to_text_equality() {
        let mut original = Fst::new();
        original
            .load_text(BufReader::new(Cursor::new(token_topo_text())))
            .unwrap();

        let mut bytes = Vec::new();
        original.dump(&mut bytes).unwrap();

        let mut reloaded = Fst::new();
        reloaded.load(&mut Cursor::new(&bytes)).unwrap();

        let mut text = Vec::new();
        reloaded.dump_text(&mut text).unwrap();
        let mut reparsed = Fst::new();
        reparsed
            .load_text(BufReader::new(Cursor::new(text)))
            .unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_load_rejects_non_empty_instance() {
        let mut fst = Fst::new();
        fst.load_text(BufReader::new(Cursor::new(token_topo_text())))
            .unwrap();

        let mut bytes = Vec::new();
        fst.dump(&mut bytes).unwrap();
        assert!(matches!(
            fst.load(&mut Cursor::new(&bytes)),
            Err(Error::PreconditionFailed(_))
        ));
        assert!(matches!(
            fst.load_text(BufReader::new(Cursor::new(token_topo_text()))),
            Err(Error::PreconditionFailed(_))
        ));
    }

    #[test]
    fn test_empty_graph_fails() {
        let mut fst = Fst::new();
        assert!(matches!(
            fst.load_text(BufReader::new(Cursor::new("0,0,0,-1\n"))),
            Err(Error::MalformedGraph(_))
        ));

        let empty = Fst::new();
        let mut sink = Vec::new();
        assert!(empty.dump(&mut sink).is_err());
        assert!(empty.dump_text(&mut sink).is_err());
    }

    #[test]
    fn test_malformed_arc_lines() {
        // missing score
        let mut fst = Fst::new();
        assert!(matches!(
            fst.load_text(BufReader::new(Cursor::new("2,1,0,1\n0\t1\t3\n"))),
            Err(Error::MalformedGraph(_))
        ));

        // extra field
        let mut fst = Fst::new();
        assert!(matches!(
            fst.load_text(BufReader::new(Cursor::new("2,1,0,1\n0\t1\t3:3/0\t9\n"))),
            Err(Error::MalformedGraph(_))
        ));

        // three-part label spec
        let mut fst = Fst::new();
        assert!(matches!(
            fst.load_text(BufReader::new(Cursor::new("2,1,0,1\n0\t1\t3:3:3/0\n"))),
            Err(Error::MalformedGraph(_))
        ));

        // arc count disagrees with header
        let mut fst = Fst::new();
        assert!(matches!(
            fst.load_text(BufReader::new(Cursor::new("2,2,0,1\n0\t1\t3:3/0\n"))),
            Err(Error::MalformedGraph(_))
        ));
    }

    #[test]
    fn test_k2_convention_violations() {
        // start state not 0
        let mut fst = Fst::new();
        assert!(fst
            .load_text(BufReader::new(Cursor::new("2,1,1,1\n0\t1\t3/0\n")))
            .is_err());

        // final state not num_states - 1
        let mut fst = Fst::new();
        assert!(fst
            .load_text(BufReader::new(Cursor::new("3,1,0,1\n0\t1\t3/0\n")))
            .is_err());
    }

    #[test]
    fn test_binary_load_rejects_unsorted_arcs() {
        let mut fst = Fst::new();
        fst.load_text(BufReader::new(Cursor::new(token_topo_text())))
            .unwrap();

        let mut bytes = Vec::new();
        fst.dump(&mut bytes).unwrap();

        // corrupt the dump by swapping two arcs of state 0 in place
        let mut tampered = Fst::new();
        tampered.load(&mut Cursor::new(&bytes)).unwrap();
        tampered.arcs.swap(0, 1);
        let mut tampered_bytes = Vec::new();
        tampered.dump(&mut tampered_bytes).unwrap();

        let mut fst2 = Fst::new();
        assert!(matches!(
            fst2.load(&mut Cursor::new(&tampered_bytes)),
            Err(Error::MalformedGraph(_))
        ));
    }

    #[test]
    fn test_acceptor_label_shorthand() {
        let mut fst = Fst::new();
        fst.load_text(BufReader::new(Cursor::new("2,1,0,1\n0\t1\t7/1.5\n")))
            .unwrap();
        let arc = fst.arcs(0)[0];
        assert_eq!(arc.ilabel, 7);
        assert_eq!(arc.olabel, 7);
        assert_eq!(arc.score, 1.5);
    }
}
