//! Token-passing beam search
//!
//! The decoder walks a decoding graph frame by frame, maintaining a frontier
//! of token sets (one per reachable graph state) and pinning each completed
//! frontier into the lattice. Hypotheses are tokens: cumulative score, one
//! context id per fused language model, and a traceback link forming a
//! backward DAG across frames.
//!
//! Per frame: expand emitting arcs, close over epsilon arcs, prune by beam
//! and frontier cap, pin down. All tokens live in the slab arena and are
//! referenced by slot id; the whole DAG is dropped wholesale at session end.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::allocator::{SlabAllocator, SlotId};
use crate::fst::{Fst, FstArc, FstStateId, EPSILON, INPUT_END};
use crate::lm::{LanguageModel, LmScore, LmStateId, PrefixTreeLm, MAX_LM};
use crate::stt::{TokenId, Tokenizer};
use trellis_config::BeamSearchConfig;
use trellis_core::{Error, Result};

/// Unique state in the decoding graph during search.
///
/// Single-graph decoding collapses the handle to a bare state id. For
/// multi-graph decoding, switch to a 64-bit packing of (graph, state);
/// these three functions are the only seam that needs to change.
pub type StateHandle = FstStateId;

#[inline]
fn compose_handle(_graph: i32, state: FstStateId) -> StateHandle {
    state
}

#[inline]
fn handle_to_state(h: StateHandle) -> FstStateId {
    h
}

/// Backward link of a token: predecessor, the arc taken, the emission score
/// consumed, and the per-LM score deltas of a word-end transition.
#[derive(Debug, Clone, Copy, Default)]
struct TraceBack {
    token: Option<SlotId>,
    arc: FstArc,
    score: f32,
    lm_scores: [LmScore; MAX_LM],
}

/// One search hypothesis fragment.
#[derive(Debug, Clone, Copy, Default)]
struct Token {
    /// Next token in the owning token set, ordered by descending score.
    next: Option<SlotId>,

    total_score: f32,
    lm_states: [LmStateId; MAX_LM],
    trace_back: TraceBack,
}

/// A (time, state handle) cell of the trellis, holding up to
/// `token_set_size` hypotheses with distinct LM contexts.
#[derive(Debug, Clone, Copy)]
struct TokenSet {
    /// None means pruned or inactive.
    head: Option<SlotId>,

    best_score: f32,
    time: i32,
    handle: StateHandle,
}

impl Default for TokenSet {
    fn default() -> Self {
        Self {
            head: None,
            best_score: f32::MIN,
            time: 0,
            handle: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Active,
    Terminal,
}

/// Beam-search decoder over an arc-sorted WFST, shallow-fused with up to
/// [`MAX_LM`] deterministic language models.
///
/// The graph and tokenizer are immutable and shared; the decoder itself owns
/// one session at a time and is not thread-safe.
pub struct BeamSearch {
    config: BeamSearchConfig,
    graph: Arc<Fst>,
    tokenizer: Arc<Tokenizer>,
    lms: Vec<Box<dyn LanguageModel>>,

    session_state: SessionState,
    session_key: String,

    // lattice indexes: [time][token_set]
    // invariant of time & frame indexing:
    //   {time=k} --[frame=k]--> {time=k+1}
    lattice: Vec<Vec<TokenSet>>,
    token_arena: SlabAllocator<Token>,

    // search frontier
    cur_time: i32,
    frontier: Vec<TokenSet>,
    frontier_map: FxHashMap<StateHandle, usize>,
    eps_queue: Vec<usize>,

    // beam range
    score_max: f32,
    score_min: f32,

    // keeps hypothesis scores in a good dynamic range over long audio
    score_offsets: Vec<f32>,

    nbest: Vec<Vec<TokenId>>,
}

impl BeamSearch {
    pub fn new(
        config: BeamSearchConfig,
        graph: Arc<Fst>,
        tokenizer: Arc<Tokenizer>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;

        if graph.is_empty() {
            return Err(Error::InvalidArgument("graph is empty".to_string()));
        }
        Self::check_graph_labels(&graph, &tokenizer)?;

        let slab_size = config.token_allocator_slab_size;
        Ok(Self {
            config,
            graph,
            tokenizer,
            lms: vec![Box::new(PrefixTreeLm)],
            session_state: SessionState::Idle,
            session_key: String::new(),
            lattice: Vec::new(),
            token_arena: SlabAllocator::new(slab_size),
            cur_time: 0,
            frontier: Vec::new(),
            frontier_map: FxHashMap::default(),
            eps_queue: Vec::new(),
            score_max: 0.0,
            score_min: 0.0,
            score_offsets: Vec::new(),
            nbest: Vec::new(),
        })
    }

    /// Register a rescoring language model. Only allowed between sessions.
    pub fn add_lm(&mut self, lm: Box<dyn LanguageModel>) -> Result<()> {
        if self.session_state != SessionState::Idle {
            return Err(Error::PreconditionFailed(
                "cannot add a language model mid-session".to_string(),
            ));
        }
        if self.lms.len() == MAX_LM {
            return Err(Error::InvalidArgument(format!(
                "at most {} language models are supported",
                MAX_LM
            )));
        }
        self.lms.push(lm);
        Ok(())
    }

    /// Every emitting ilabel must index into the frame score vector, and
    /// end-of-input arcs must all lead to the single final state.
    fn check_graph_labels(graph: &Fst, tokenizer: &Tokenizer) -> Result<()> {
        let vocab = tokenizer.size() as i64;
        for arc in &graph.arcs {
            if arc.ilabel != EPSILON && arc.ilabel != INPUT_END {
                if !(0..vocab).contains(&(arc.ilabel as i64)) {
                    return Err(Error::MalformedGraph(format!(
                        "emitting label {} outside tokenizer range [0, {})",
                        arc.ilabel, vocab
                    )));
                }
            }
            if arc.ilabel == INPUT_END && arc.dst != graph.final_state {
                return Err(Error::MalformedGraph(format!(
                    "end-of-input arc leads to {}, not the final state {}",
                    arc.dst, graph.final_state
                )));
            }
        }
        Ok(())
    }

    /// Begin a decoding session: install the initial hypothesis at the start
    /// state with bos-seeded LM contexts, close over epsilon arcs and pin
    /// the result as frame 0.
    pub fn init_session(&mut self, session_key: &str) -> Result<()> {
        if self.session_state != SessionState::Idle {
            return Err(Error::PreconditionFailed(
                "session already in progress".to_string(),
            ));
        }
        self.session_key = session_key.to_string();

        debug_assert_eq!(self.token_arena.num_used(), 0);
        debug_assert!(self.lattice.is_empty());
        debug_assert!(self.frontier.is_empty());

        // 25 frames/sec (subsampled) * 30 seconds
        self.lattice.reserve(25 * 30);
        let frontier_cap = if self.config.max_active > 0 {
            self.config.max_active as usize * 3
        } else {
            64
        };
        self.frontier.reserve(frontier_cap);
        self.frontier_map.reserve(frontier_cap * 2);

        if self.config.apply_score_offsets {
            debug_assert!(self.score_offsets.is_empty());
            self.score_offsets.push(0.0);
        }

        let t = self.token_arena.alloc()?;
        {
            let bos = self.tokenizer.bos;
            let mut total_score = 0.0;
            let mut lm_states = [0 as LmStateId; MAX_LM];
            for (i, lm) in self.lms.iter().enumerate() {
                let (lm_score, state) = lm.score(lm.null_state(), bos);
                total_score += lm_score;
                lm_states[i] = state;
            }

            let token = self.token_arena.get_mut(t);
            // the initial traceback is all-epsilon: bos seeds the LM
            // contexts but is never emitted in the n-best output
            token.trace_back.arc.ilabel = EPSILON;
            token.trace_back.arc.olabel = EPSILON;
            token.total_score = total_score;
            token.lm_states = lm_states;
        }

        debug_assert_eq!(self.cur_time, 0);
        let k = self.find_or_add_token_set(self.cur_time, compose_handle(0, self.graph.start_state));
        debug_assert_eq!(k, 0);

        let total_score = self.token_arena.get(t).total_score;
        let ts = &mut self.frontier[0];
        debug_assert!(ts.head.is_none());
        ts.head = Some(t);
        ts.best_score = total_score;

        self.score_max = total_score;
        self.score_min = self.score_max - self.config.beam;

        self.expand_eps()?;
        self.pin_down();

        self.session_state = SessionState::Active;
        tracing::debug!(session = %self.session_key, "session initialized");
        Ok(())
    }

    /// Consume one frame of acoustic log-posteriors (one entry per token id)
    /// and advance the frontier by one time step.
    pub fn push(&mut self, frame_score: &[f32]) -> Result<()> {
        if self.session_state != SessionState::Active {
            return Err(Error::PreconditionFailed(
                "push outside an active session".to_string(),
            ));
        }
        if frame_score.len() != self.tokenizer.size() {
            return Err(Error::InvalidArgument(format!(
                "frame has {} scores, tokenizer has {} tokens",
                frame_score.len(),
                self.tokenizer.size()
            )));
        }

        self.expand_emitting(frame_score)?;
        self.expand_eps()?;
        self.prune();
        self.pin_down();

        if self.config.debug {
            tracing::debug!(
                time = self.cur_time,
                score_max = self.score_max,
                beam = self.score_max - self.score_min,
                active = self.lattice.last().map_or(0, Vec::len),
                "frame"
            );
        }
        Ok(())
    }

    /// Signal end of input: one additional expansion restricted to
    /// end-of-input arcs, then the n-best traceback.
    pub fn push_eos(&mut self) -> Result<()> {
        if self.session_state != SessionState::Active {
            return Err(Error::PreconditionFailed(
                "push_eos outside an active session".to_string(),
            ));
        }
        self.session_state = SessionState::Terminal;

        self.expand_eos()?;
        self.trace_best_path()
    }

    /// N-best token-id sequences, sorted by decreasing total score.
    /// Valid after `push_eos` and until `deinit_session`.
    pub fn n_best(&self) -> &[Vec<TokenId>] {
        &self.nbest
    }

    /// End the session and release all per-session storage. Idempotent; the
    /// decoder is immediately reusable via `init_session`.
    pub fn deinit_session(&mut self) {
        self.cur_time = 0;
        self.frontier.clear();
        self.frontier_map.clear();
        self.eps_queue.clear();

        self.lattice.clear();
        self.token_arena.clear();

        self.score_max = 0.0;
        self.score_min = 0.0;
        self.score_offsets.clear();

        self.nbest.clear();
        self.session_key.clear();
        self.session_state = SessionState::Idle;
    }

    fn find_or_add_token_set(&mut self, time: i32, handle: StateHandle) -> usize {
        debug_assert_eq!(self.cur_time, time);

        match self.frontier_map.get(&handle) {
            Some(&k) => k,
            None => {
                let k = self.frontier.len();
                self.frontier.push(TokenSet {
                    time,
                    handle,
                    ..TokenSet::default()
                });
                self.frontier_map.insert(handle, k);
                k
            }
        }
    }

    fn context_equal(x: &Token, y: &Token, num_lms: usize) -> bool {
        x.lm_states[..num_lms] == y.lm_states[..num_lms]
    }

    /// Derive destination tokens from every token of `src` along `arc`.
    ///
    /// Most candidates die to pruning or context recombination, so each is
    /// probed as a stack value and copied into the arena only on survival.
    /// Returns whether the destination set changed; that is the re-queue
    /// signal for epsilon expansion.
    fn token_passing(&mut self, src: TokenSet, arc: &FstArc, score: f32, dst_k: usize) -> Result<bool> {
        let mut changed = false;
        let num_lms = self.lms.len();
        let token_set_size = self.config.token_set_size;

        let mut src_iter = src.head;
        while let Some(tr) = src_iter {
            let t = *self.token_arena.get(tr);
            src_iter = t.next;

            let mut nt = Token::default();

            // 1. graph & acoustic score
            nt.total_score = t.total_score + arc.score + score;

            // 2. LM
            if arc.olabel == EPSILON {
                nt.lm_states = t.lm_states;
            } else {
                // word-end arc
                for (i, lm) in self.lms.iter().enumerate() {
                    let (lm_score, state) = lm.score(t.lm_states[i], arc.olabel);
                    nt.trace_back.lm_scores[i] = lm_score;
                    nt.lm_states[i] = state;
                    nt.total_score += lm_score;
                }
                nt.total_score -= self.config.insertion_penalty;
            }

            // 3. traceback
            nt.trace_back.token = Some(tr);
            nt.trace_back.arc = *arc;
            nt.trace_back.score = score;

            // beam pruning; a high enough candidate lifts the whole range
            // so the window slides without widening
            if nt.total_score < self.score_min {
                continue;
            } else if nt.total_score > self.score_max {
                self.score_min += nt.total_score - self.score_max;
                self.score_max = nt.total_score;
            }

            // context recombination: at most one token per LM context
            let mut survived = true;
            {
                let mut k = 0;
                let mut prev: Option<SlotId> = None;
                let mut cur = self.frontier[dst_k].head;
                while k < token_set_size {
                    let Some(cr) = cur else { break };
                    let c = *self.token_arena.get(cr);
                    if Self::context_equal(&c, &nt, num_lms) {
                        if c.total_score < nt.total_score {
                            // existing token is worse, remove it
                            match prev {
                                None => self.frontier[dst_k].head = c.next,
                                Some(pr) => self.token_arena.get_mut(pr).next = c.next,
                            }
                            self.token_arena.free(cr);
                            changed = true;
                        } else {
                            // existing token is better, kill the candidate
                            survived = false;
                        }
                        break;
                    }
                    prev = Some(cr);
                    cur = c.next;
                    k += 1;
                }
            }

            if survived {
                // insert position keeping the list in descending score order
                let mut k = 0;
                let mut prev: Option<SlotId> = None;
                let mut cur = self.frontier[dst_k].head;
                while k < token_set_size {
                    let Some(cr) = cur else { break };
                    let c = self.token_arena.get(cr);
                    if c.total_score <= nt.total_score {
                        break;
                    }
                    prev = Some(cr);
                    cur = c.next;
                    k += 1;
                }

                if k != token_set_size {
                    let q = self.token_arena.alloc()?;
                    nt.next = cur;
                    *self.token_arena.get_mut(q) = nt;
                    match prev {
                        None => self.frontier[dst_k].head = Some(q),
                        Some(pr) => self.token_arena.get_mut(pr).next = Some(q),
                    }
                    changed = true;
                }
            }
        }

        if changed {
            if let Some(head) = self.frontier[dst_k].head {
                self.frontier[dst_k].best_score = self.token_arena.get(head).total_score;
            }
        }

        Ok(changed)
    }

    fn expand_emitting(&mut self, frame_score: &[f32]) -> Result<()> {
        debug_assert!(self.frontier.is_empty());

        // drop the beam floor so the first surviving token re-establishes it
        self.score_max -= 1000.0;
        self.score_min -= 1000.0;
        self.cur_time += 1; // consumes a time frame

        let score_offset = if self.config.apply_score_offsets {
            self.score_offsets.last().copied().unwrap_or(0.0)
        } else {
            0.0
        };

        let graph = Arc::clone(&self.graph);
        let pinned = self.lattice.len() - 1;
        for i in 0..self.lattice[pinned].len() {
            let src = self.lattice[pinned][i];
            for arc in graph.arcs(handle_to_state(src.handle)) {
                if arc.ilabel != EPSILON && arc.ilabel != INPUT_END {
                    let score = frame_score[arc.ilabel as usize] + score_offset;
                    if src.best_score + arc.score + score < self.score_min {
                        continue;
                    }

                    let dst_k = self.find_or_add_token_set(self.cur_time, compose_handle(0, arc.dst));
                    self.token_passing(src, arc, score, dst_k)?;
                }
            }
        }
        Ok(())
    }

    /// Epsilon closure over the frontier. The work list holds frontier
    /// indices, which stay valid while the frontier only grows; termination
    /// relies on the graph being epsilon-acyclic.
    fn expand_eps(&mut self) -> Result<()> {
        debug_assert!(self.eps_queue.is_empty());

        let graph = Arc::clone(&self.graph);
        for k in 0..self.frontier.len() {
            if graph.contains_epsilon_arc(handle_to_state(self.frontier[k].handle)) {
                self.eps_queue.push(k);
            }
        }

        while let Some(src_k) = self.eps_queue.pop() {
            let src = self.frontier[src_k];
            if src.best_score < self.score_min {
                continue;
            }

            for arc in graph.arcs(handle_to_state(src.handle)) {
                if arc.ilabel == EPSILON {
                    if src.best_score + arc.score < self.score_min {
                        continue;
                    }

                    let dst_k = self.find_or_add_token_set(self.cur_time, compose_handle(0, arc.dst));
                    let changed = self.token_passing(src, arc, 0.0, dst_k)?;

                    if changed && graph.contains_epsilon_arc(arc.dst) {
                        self.eps_queue.push(dst_k);
                    }
                }
            }
        }
        Ok(())
    }

    fn expand_eos(&mut self) -> Result<()> {
        debug_assert!(self.frontier.is_empty());

        let graph = Arc::clone(&self.graph);
        let pinned = self.lattice.len() - 1;
        for i in 0..self.lattice[pinned].len() {
            let src = self.lattice[pinned][i];
            for arc in graph.arcs(handle_to_state(src.handle)) {
                if arc.ilabel == INPUT_END {
                    let dst_k = self.find_or_add_token_set(self.cur_time, compose_handle(0, arc.dst));
                    self.token_passing(src, arc, 0.0, dst_k)?;
                }
            }
        }
        Ok(())
    }

    /// Tighten the beam and enforce the frontier cap. Ordering is total:
    /// best score descending, handle ascending on ties, so the partition is
    /// stable across runs.
    fn prune(&mut self) {
        fn better(x: &TokenSet, y: &TokenSet) -> std::cmp::Ordering {
            y.best_score
                .total_cmp(&x.best_score)
                .then(x.handle.cmp(&y.handle))
        }

        self.score_min = self.score_max - self.config.beam;

        // adapt the beam to the max_active constraint
        let max_active = self.config.max_active as usize;
        if self.config.max_active > 0 && self.frontier.len() > max_active {
            self.frontier.select_nth_unstable_by(max_active - 1, better);
            self.frontier.truncate(max_active);

            let weakest = self.frontier[max_active - 1].best_score;
            self.score_min = self.score_min.max(weakest);
        }

        // best token set first, so the next frame's beam bootstraps quickly
        if !self.frontier.is_empty() {
            self.frontier.select_nth_unstable_by(0, better);
            debug_assert_eq!(self.frontier[0].best_score, self.score_max);
        }
    }

    /// Copy the frontier into a new lattice frame. Copy rather than move, so
    /// the frontier's reserved capacity carries across frames.
    fn pin_down(&mut self) {
        self.lattice.push(self.frontier.clone());

        self.frontier.clear();
        self.frontier_map.clear();

        if self.config.apply_score_offsets {
            self.score_offsets.push(-self.score_max);
        }
    }

    fn trace_best_path(&mut self) -> Result<()> {
        debug_assert!(self.nbest.is_empty());

        let final_handle = compose_handle(0, self.graph.final_state);
        let Some(&k) = self.frontier_map.get(&final_handle) else {
            tracing::warn!(
                session = %self.session_key,
                "no surviving hypothesis reaches the end"
            );
            return Err(Error::NoRecognitionResult);
        };
        // end-of-input arcs all lead to the single final state
        debug_assert_eq!(self.frontier.len(), 1);

        let mut n = 0;
        let mut head = self.frontier[k].head;
        while let Some(p) = head {
            if n == self.config.nbest {
                break;
            }

            let mut path: Vec<TokenId> = Vec::new();
            let mut cur = Some(p);
            while let Some(tr) = cur {
                let t = self.token_arena.get(tr);
                if t.trace_back.arc.olabel != EPSILON {
                    path.push(t.trace_back.arc.olabel);
                }
                cur = t.trace_back.token;
            }
            path.reverse();
            self.nbest.push(path);

            head = self.token_arena.get(p).next;
            n += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    /// Test LM whose state is a hash chain over the emitted words, so
    /// hypotheses with different histories never share a context.
    struct HistoryLm;

    impl LanguageModel for HistoryLm {
        fn null_state(&self) -> LmStateId {
            0
        }

        fn score(&self, state: LmStateId, olabel: i32) -> (f32, LmStateId) {
            (0.0, state.wrapping_mul(31).wrapping_add(olabel))
        }
    }

    fn tokenizer(extra: &[&str]) -> Arc<Tokenizer> {
        let mut tokens = vec![
            "<blk>".to_string(),
            "<unk>".to_string(),
            "<s>".to_string(),
            "</s>".to_string(),
        ];
        tokens.extend(extra.iter().map(|s| s.to_string()));
        Arc::new(Tokenizer::from_tokens(tokens))
    }

    fn graph_from_text(text: &str) -> Arc<Fst> {
        let mut fst = Fst::new();
        fst.load_text(BufReader::new(Cursor::new(text.to_string())))
            .unwrap();
        Arc::new(fst)
    }

    fn config() -> BeamSearchConfig {
        BeamSearchConfig {
            apply_score_offsets: false,
            ..BeamSearchConfig::default()
        }
    }

    #[test]
    fn test_single_arc_acceptance() {
        let tok = tokenizer(&["a", "b"]);
        let graph = graph_from_text("2,1,0,1\n0\t1\t-1:3/0\n");

        let mut search = BeamSearch::new(config(), graph, tok).unwrap();
        search.init_session("utt1").unwrap();
        search.push_eos().unwrap();

        assert_eq!(search.n_best(), &[vec![3]]); // exactly [eos]
        search.deinit_session();
    }

    #[test]
    fn test_decodes_through_token_topology() {
        let tok = tokenizer(&["a", "b"]);
        let mut fst = Fst::new();
        fst.build_token_topology(&tok).unwrap();
        let graph = Arc::new(fst);

        let mut search = BeamSearch::new(config(), graph, tok.clone()).unwrap();
        search.init_session("utt1").unwrap();

        // frames favoring: a, a (held), blank, b
        let a = tok.id("a").unwrap() as usize;
        let b = tok.id("b").unwrap() as usize;
        let blk = tok.blk as usize;
        for favored in [a, a, blk, b] {
            let mut frame = vec![-5.0f32; tok.size()];
            frame[favored] = 0.0;
            search.push(&frame).unwrap();
        }
        search.push_eos().unwrap();

        // held `a` collapses onto one emission
        assert_eq!(search.n_best(), &[vec![4, 5, 3]]);
        search.deinit_session();
    }

    #[test]
    fn test_beam_prunes_weak_parallel_branch() {
        let tok = tokenizer(&["a", "b"]);
        let graph = graph_from_text("3,3,0,2\n0\t1\t4:4/5\n0\t1\t5:5/-5\n1\t2\t-1:3/0\n");

        let mut cfg = config();
        cfg.beam = 4.0;
        cfg.token_set_size = 3;

        let mut search = BeamSearch::new(cfg, graph, tok.clone()).unwrap();
        search.add_lm(Box::new(HistoryLm)).unwrap();
        search.init_session("utt1").unwrap();

        search.push(&vec![0.0; tok.size()]).unwrap();

        // the -5 branch must not appear in any token set
        let frame = search.lattice.last().unwrap();
        assert_eq!(frame.len(), 1);
        let ts = &frame[0];
        assert_eq!(ts.handle, 1);

        let mut olabels = Vec::new();
        let mut cur = ts.head;
        while let Some(tr) = cur {
            let t = search.token_arena.get(tr);
            olabels.push(t.trace_back.arc.olabel);
            cur = t.next;
        }
        assert_eq!(olabels, vec![4]);
        search.deinit_session();
    }

    #[test]
    fn test_insertion_penalty_applied_once_per_word_end() {
        let tok = tokenizer(&["a", "b"]);
        let graph = graph_from_text("2,2,0,1\n0\t0\t4:4/0\n0\t1\t-1:3/0\n");

        let mut cfg = config();
        cfg.insertion_penalty = 2.0;

        let mut search = BeamSearch::new(cfg, graph, tok.clone()).unwrap();
        // a second LM must not change how often the penalty applies
        search.add_lm(Box::new(HistoryLm)).unwrap();
        search.init_session("utt1").unwrap();

        let mut frame = vec![0.0f32; tok.size()];
        frame[4] = 1.5;
        search.push(&frame).unwrap();

        // 0 (init) + 1.5 (acoustic) + 0 (arc, LMs) - 2.0 (penalty)
        let ts = &search.lattice.last().unwrap()[0];
        assert_eq!(ts.best_score, -0.5);

        search.push_eos().unwrap();
        assert_eq!(search.n_best(), &[vec![4, 3]]);
        search.deinit_session();
    }

    #[test]
    fn test_nbest_returns_distinct_contexts_sorted() {
        let tok = tokenizer(&["a", "b", "c"]);
        let graph = graph_from_text(
            "3,4,0,2\n0\t1\t4:4/0\n0\t1\t5:5/-0.5\n0\t1\t6:6/-1\n1\t2\t-1:3/0\n",
        );

        let mut cfg = config();
        cfg.beam = 100.0;
        cfg.token_set_size = 3;
        cfg.nbest = 3;

        let mut search = BeamSearch::new(cfg, graph, tok.clone()).unwrap();
        search.add_lm(Box::new(HistoryLm)).unwrap();
        search.init_session("utt1").unwrap();

        let mut frame = vec![0.0f32; tok.size()];
        frame[4] = 2.0;
        frame[5] = 1.0;
        frame[6] = 0.5;
        search.push(&frame).unwrap();
        search.push_eos().unwrap();

        assert_eq!(
            search.n_best(),
            &[vec![4, 3], vec![5, 3], vec![6, 3]] // decreasing total score
        );
        search.deinit_session();
    }

    #[test]
    fn test_token_set_size_one_is_viterbi() {
        let tok = tokenizer(&["a", "b", "c"]);
        let graph = graph_from_text(
            "3,4,0,2\n0\t1\t4:4/0\n0\t1\t5:5/-0.5\n0\t1\t6:6/-1\n1\t2\t-1:3/0\n",
        );

        let mut cfg = config();
        cfg.beam = 100.0;
        cfg.token_set_size = 1;
        cfg.nbest = 3;

        let mut search = BeamSearch::new(cfg, graph, tok.clone()).unwrap();
        search.add_lm(Box::new(HistoryLm)).unwrap();
        search.init_session("utt1").unwrap();

        let mut frame = vec![0.0f32; tok.size()];
        frame[4] = 2.0;
        frame[5] = 1.0;
        search.push(&frame).unwrap();

        // single best hypothesis per state
        let ts = &search.lattice.last().unwrap()[0];
        let head = ts.head.unwrap();
        assert!(search.token_arena.get(head).next.is_none());

        search.push_eos().unwrap();
        assert_eq!(search.n_best(), &[vec![4, 3]]);
        search.deinit_session();
    }

    #[test]
    fn test_max_active_caps_the_frontier() {
        let tok = tokenizer(&["a", "b", "c"]);
        let graph = graph_from_text(
            "5,6,0,4\n\
             0\t1\t4:4/0\n\
             0\t2\t5:5/0\n\
             0\t3\t6:6/0\n\
             1\t4\t-1:3/0\n\
             2\t4\t-1:3/0\n\
             3\t4\t-1:3/0\n",
        );

        let mut cfg = config();
        cfg.beam = 100.0;
        cfg.max_active = 2;

        let mut search = BeamSearch::new(cfg, graph, tok.clone()).unwrap();
        search.init_session("utt1").unwrap();

        let mut frame = vec![0.0f32; tok.size()];
        frame[4] = 3.0;
        frame[5] = 2.0;
        frame[6] = 1.0;
        search.push(&frame).unwrap();

        let pinned = search.lattice.last().unwrap();
        assert_eq!(pinned.len(), 2);
        let mut handles: Vec<_> = pinned.iter().map(|ts| ts.handle).collect();
        handles.sort_unstable();
        assert_eq!(handles, vec![1, 2]); // the two strongest branches
        assert_eq!(pinned[0].best_score, 3.0); // best set pinned first

        search.deinit_session();
    }

    #[test]
    fn test_max_active_zero_disables_the_cap() {
        let tok = tokenizer(&["a", "b", "c"]);
        let graph = graph_from_text(
            "5,6,0,4\n\
             0\t1\t4:4/0\n\
             0\t2\t5:5/0\n\
             0\t3\t6:6/0\n\
             1\t4\t-1:3/0\n\
             2\t4\t-1:3/0\n\
             3\t4\t-1:3/0\n",
        );

        let mut cfg = config();
        cfg.beam = 100.0;
        cfg.max_active = 0;

        let mut search = BeamSearch::new(cfg, graph, tok.clone()).unwrap();
        search.init_session("utt1").unwrap();
        search.push(&vec![0.0; tok.size()]).unwrap();
        assert_eq!(search.lattice.last().unwrap().len(), 3);
        search.deinit_session();
    }

    #[test]
    fn test_no_recognition_result_keeps_session_deinitable() {
        let tok = tokenizer(&["a"]);
        // final state reachable only by end-of-input from state 1, which is
        // itself unreachable without an emission
        let graph = graph_from_text("3,2,0,2\n0\t1\t4:4/0\n1\t2\t-1:3/0\n");

        let mut search = BeamSearch::new(config(), graph, tok).unwrap();
        search.init_session("utt1").unwrap();

        // eos straight away: nothing at a state with an end-of-input arc
        assert!(matches!(search.push_eos(), Err(Error::NoRecognitionResult)));
        assert!(search.n_best().is_empty());

        search.deinit_session();
        assert_eq!(search.token_arena.num_used(), 0);
    }

    #[test]
    fn test_lifecycle_violations() {
        let tok = tokenizer(&["a"]);
        let graph = graph_from_text("2,1,0,1\n0\t1\t-1:3/0\n");
        let mut search = BeamSearch::new(config(), graph, tok.clone()).unwrap();

        // push before init
        assert!(matches!(
            search.push(&vec![0.0; tok.size()]),
            Err(Error::PreconditionFailed(_))
        ));
        assert!(matches!(search.push_eos(), Err(Error::PreconditionFailed(_))));

        search.init_session("utt1").unwrap();
        assert!(matches!(
            search.init_session("utt2"),
            Err(Error::PreconditionFailed(_))
        ));

        // wrong frame width
        assert!(matches!(
            search.push(&[0.0; 3]),
            Err(Error::InvalidArgument(_))
        ));

        search.push_eos().unwrap();
        // push after eos
        assert!(matches!(
            search.push(&vec![0.0; tok.size()]),
            Err(Error::PreconditionFailed(_))
        ));

        search.deinit_session();
    }

    #[test]
    fn test_deinit_is_idempotent_and_releases_tokens() {
        let tok = tokenizer(&["a", "b"]);
        let mut fst = Fst::new();
        fst.build_token_topology(&tok).unwrap();
        let mut search = BeamSearch::new(config(), Arc::new(fst), tok.clone()).unwrap();

        search.init_session("utt1").unwrap();
        for _ in 0..3 {
            search.push(&vec![0.0; tok.size()]).unwrap();
        }
        assert!(search.token_arena.num_used() > 0);

        search.deinit_session();
        assert_eq!(search.token_arena.num_used(), 0);
        assert!(search.lattice.is_empty());
        assert!(search.score_offsets.is_empty());

        // second deinit is a no-op
        search.deinit_session();
        assert_eq!(search.token_arena.num_used(), 0);

        // session can be restarted afterwards
        search.init_session("utt2").unwrap();
        search.push(&vec![0.0; tok.size()]).unwrap();
        search.push_eos().unwrap();
        search.deinit_session();
    }

    #[test]
    fn test_score_offsets_keep_totals_bounded() {
        let tok = tokenizer(&["a", "b"]);
        let mut fst = Fst::new();
        fst.build_token_topology(&tok).unwrap();
        let graph = Arc::new(fst);

        let mut cfg = config();
        cfg.apply_score_offsets = true;

        let mut search = BeamSearch::new(cfg, graph, tok.clone()).unwrap();
        search.init_session("utt1").unwrap();

        // constant positive frame scores: without offsets the running best
        // would grow by ~5 per frame
        let frame = vec![5.0f32; tok.size()];
        for _ in 0..50 {
            search.push(&frame).unwrap();
            assert!(search.score_max.is_finite());
            assert!(search.score_max.abs() < 100.0);
        }

        // one offset seeded at init, one appended per pinned frame
        assert_eq!(search.score_offsets.len(), search.lattice.len() + 1);
        search.deinit_session();
    }

    #[test]
    fn test_lattice_invariants_hold_after_each_frame() {
        let tok = tokenizer(&["a", "b"]);
        let mut fst = Fst::new();
        fst.build_token_topology(&tok).unwrap();
        let mut cfg = config();
        cfg.token_set_size = 2;

        let mut search = BeamSearch::new(cfg, Arc::new(fst), tok.clone()).unwrap();
        search.add_lm(Box::new(HistoryLm)).unwrap();
        search.init_session("utt1").unwrap();

        for step in 0..4 {
            let mut frame = vec![-1.0f32; tok.size()];
            frame[4 + step % 2] = 0.0;
            search.push(&frame).unwrap();

            assert_eq!(search.lattice.len(), search.cur_time as usize + 1);
            for ts in search.lattice.last().unwrap() {
                let Some(head) = ts.head else { continue };
                assert_eq!(ts.best_score, search.token_arena.get(head).total_score);

                // head list is in non-increasing score order
                let mut cur = Some(head);
                let mut last = f32::MAX;
                while let Some(tr) = cur {
                    let t = search.token_arena.get(tr);
                    assert!(t.total_score <= last);
                    last = t.total_score;
                    cur = t.next;
                }
            }
        }
        search.deinit_session();
    }

    #[test]
    fn test_rejects_graph_with_out_of_range_labels() {
        let tok = tokenizer(&[]); // size 4, no normal tokens
        let graph = graph_from_text("2,1,0,1\n0\t1\t9:9/0\n");
        assert!(matches!(
            BeamSearch::new(config(), graph, tok),
            Err(Error::MalformedGraph(_))
        ));
    }
}
