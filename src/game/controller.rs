//! Match controller
//!
//! Owns the board and runs the turn loop. Opponent moves are computed on a
//! worker thread and collected with [`MatchController::poll_opponent`] (or
//! [`MatchController::wait_for_opponent`]), so the caller's loop never
//! blocks on the AI. At most one opponent request exists at a time; while
//! it is out, human input is ignored.

use std::mem;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::observer::MatchObserver;
use super::snapshot::{MatchSnapshot, MoveSnapshot};
use super::{GameEnd, MoveOutcome};
use crate::board::{Board, Edge, Player, Pos};
use crate::config::{GameMode, MatchConfig};
use crate::engine::{EngineBridge, EngineMoveResult, EngineReply};
use crate::error::{BoardError, EngineError, MatchError};
use crate::eval::{select_move, AiTier};
use crate::rules::{find_winning_line, forbidden_move, winning_line, GameRule};

/// Opponent computation state
enum OpponentState {
    Idle,
    Thinking {
        receiver: Receiver<WorkerReply>,
        /// Rolls back the human move the engine was told about
        snapshot: Option<MoveSnapshot>,
        start_time: Instant,
    },
}

enum WorkerReply {
    Heuristic(Option<Pos>),
    /// The bridge travels to the worker and back with the reply
    Engine {
        bridge: EngineBridge,
        reply: Result<EngineReply, EngineError>,
    },
}

enum EngineRequest {
    Begin,
    Turn { x: usize, y: usize },
    Board(Vec<(usize, usize, u8)>),
}

pub struct MatchController {
    config: MatchConfig,
    board: Board,
    current: Player,
    last_move: Option<Pos>,
    move_history: Vec<(Pos, Player)>,
    paused: bool,
    game_over: Option<GameEnd>,
    /// Professional only while an engine session is alive
    tier: AiTier,
    /// Idle engine; `None` while a request is in flight or when inactive
    engine: Option<EngineBridge>,
    /// The engine's position matches ours up to the last move
    engine_synced: bool,
    opponent: OpponentState,
    observer: Box<dyn MatchObserver>,
    rng: StdRng,
}

impl MatchController {
    pub fn new(config: MatchConfig, observer: Box<dyn MatchObserver>) -> Self {
        Self::with_rng(config, observer, StdRng::from_os_rng())
    }

    /// Same as `new` with a reproducible AI
    pub fn with_seed(config: MatchConfig, observer: Box<dyn MatchObserver>, seed: u64) -> Self {
        Self::with_rng(config, observer, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: MatchConfig, observer: Box<dyn MatchObserver>, rng: StdRng) -> Self {
        let wants_engine = config.ai_tier == AiTier::Professional;
        let mut controller = Self {
            board: fresh_board(&config),
            current: config.starting_player,
            last_move: None,
            move_history: Vec::new(),
            paused: false,
            game_over: None,
            tier: if wants_engine { AiTier::Hard } else { config.ai_tier },
            engine: None,
            engine_synced: false,
            opponent: OpponentState::Idle,
            observer,
            rng,
            config,
        };

        if wants_engine {
            // Failure is reported through the observer and falls back to Hard
            if let Err(err) = controller.activate_professional() {
                debug!(%err, "starting without the external engine");
            }
        }
        controller.schedule_opponent(None);
        controller
    }

    // Accessors

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[inline]
    pub fn rule(&self) -> GameRule {
        self.config.rule
    }

    #[inline]
    pub fn current_player(&self) -> Player {
        self.current
    }

    #[inline]
    pub fn last_move(&self) -> Option<Pos> {
        self.last_move
    }

    #[inline]
    pub fn move_history(&self) -> &[(Pos, Player)] {
        &self.move_history
    }

    #[inline]
    pub fn tier(&self) -> AiTier {
        self.tier
    }

    #[inline]
    pub fn game_over(&self) -> Option<GameEnd> {
        self.game_over
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// An opponent move is being computed
    #[inline]
    pub fn is_thinking(&self) -> bool {
        matches!(self.opponent, OpponentState::Thinking { .. })
    }

    /// An external engine session is alive (idle or busy)
    pub fn engine_active(&self) -> bool {
        self.tier == AiTier::Professional
    }

    pub fn is_human_turn(&self) -> bool {
        match self.config.mode {
            GameMode::PvE { human } => self.current == human,
            GameMode::PvP => true,
        }
    }

    /// Human move at `pos`
    pub fn play(&mut self, pos: Pos) -> MoveOutcome {
        if self.paused || self.game_over.is_some() || self.is_thinking() || !self.is_human_turn() {
            return MoveOutcome::Ignored;
        }
        let snapshot = self.snapshot_for(pos);
        let outcome = self.apply_move(pos);
        self.settle(&outcome, Some(snapshot));
        outcome
    }

    /// Apply the opponent's move if it is ready. Never blocks.
    pub fn poll_opponent(&mut self) -> Option<MoveOutcome> {
        if self.paused {
            return None;
        }
        let OpponentState::Thinking { receiver, .. } = &self.opponent else {
            return None;
        };
        let reply = match receiver.try_recv() {
            Ok(reply) => reply,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                self.worker_lost();
                return None;
            }
        };
        self.resolve(reply)
    }

    /// Block until the opponent's move is ready and apply it
    pub fn wait_for_opponent(&mut self) -> Option<MoveOutcome> {
        if self.paused {
            return None;
        }
        let OpponentState::Thinking { receiver, .. } = &self.opponent else {
            return None;
        };
        match receiver.recv() {
            Ok(reply) => self.resolve(reply),
            Err(_) => {
                self.worker_lost();
                None
            }
        }
    }

    /// While paused, human moves are ignored and opponent replies are held
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        self.observer.status(if paused { "paused" } else { "resumed" });
    }

    /// Discard the board and start over with the configured settings
    pub fn new_match(&mut self) {
        self.settle_worker();

        self.board = fresh_board(&self.config);
        self.current = self.config.starting_player;
        self.last_move = None;
        self.move_history.clear();
        self.game_over = None;
        self.paused = false;
        self.observer.board_resized(self.board.rows(), self.board.cols());

        self.restart_engine();
        self.engine_synced = true;
        info!(rows = self.board.rows(), cols = self.board.cols(), rule = %self.config.rule, "new match");
        self.schedule_opponent(None);
    }

    /// Launch the external engine and hand it the AI's side.
    ///
    /// On failure the match continues with the Hard heuristic and the
    /// error is reported through the observer as well as returned.
    pub fn activate_professional(&mut self) -> Result<(), MatchError> {
        if self.engine_active() {
            return Ok(());
        }
        match self.launch_engine() {
            Ok(bridge) => {
                info!(pid = ?bridge.pid(), "professional mode active");
                self.engine = Some(bridge);
                self.engine_synced = self.board.is_board_empty();
                self.tier = AiTier::Professional;
                self.observer.status("engine ready");
                self.schedule_opponent(None);
                Ok(())
            }
            Err(err) => {
                self.degrade(&err.to_string());
                Err(err.into())
            }
        }
    }

    fn launch_engine(&self) -> Result<EngineBridge, EngineError> {
        let mut bridge = EngineBridge::launch(&self.config.engine)?;
        bridge.start(self.board.rows(), self.board.cols(), self.config.rule)?;
        Ok(bridge)
    }

    /// Switch to a local tier, shutting the engine down if one is running
    pub fn set_tier(&mut self, tier: AiTier) -> Result<(), MatchError> {
        if tier == AiTier::Professional {
            return self.activate_professional();
        }
        if self.engine_active() {
            self.settle_worker();
            if let Some(mut bridge) = self.engine.take() {
                bridge.shutdown();
            }
        }
        self.tier = tier;
        // A dropped engine request leaves the AI's turn unanswered
        self.schedule_opponent(None);
        Ok(())
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::capture(&self.board, self.config.rule, self.current, self.last_move)
    }

    /// Replace the position with a saved one of the same size
    pub fn restore(&mut self, snapshot: &MatchSnapshot) -> Result<(), MatchError> {
        let (rows, cols) = (self.board.rows(), self.board.cols());
        if (snapshot.rows, snapshot.cols) != (rows, cols) {
            return Err(MatchError::SizeMismatch {
                saved_rows: snapshot.rows,
                saved_cols: snapshot.cols,
                rows,
                cols,
            });
        }
        let board = snapshot.to_board(self.config.expansion.max_rows, self.config.expansion.max_cols)?;

        self.settle_worker();
        self.board = board;
        self.config.rule = snapshot.rule;
        self.current = snapshot.current_player;
        self.last_move = snapshot.last_move;
        // Move order is not saved
        self.move_history.clear();
        self.game_over = if let Some((winner, _)) = find_winning_line(&self.board, self.config.rule) {
            Some(GameEnd {
                winner: Some(winner),
                has_winner: true,
            })
        } else if self.board.is_full() {
            Some(GameEnd {
                winner: None,
                has_winner: false,
            })
        } else {
            None
        };

        self.observer.board_resized(rows, cols);
        for (pos, cell) in self.board.cells() {
            self.observer.cell_changed(pos, cell);
        }

        self.restart_engine();
        self.engine_synced = self.board.is_board_empty();
        info!(stones = self.board.stone_count(), current = %self.current, "match restored");
        self.schedule_opponent(None);
        Ok(())
    }

    // Turn loop

    fn snapshot_for(&self, pos: Pos) -> MoveSnapshot {
        MoveSnapshot {
            pos,
            prior_occupant: self.board.get(pos),
            prior_last_move: self.last_move,
            prior_player: self.current,
        }
    }

    /// Place a stone for the side to move, validate it, then resolve the
    /// win, the draw and the turn swap
    fn apply_move(&mut self, pos: Pos) -> MoveOutcome {
        let player = self.current;
        let rule = self.config.rule;

        match self.board.place(pos, player) {
            Ok(()) => {}
            Err(BoardError::Occupied(_)) => return MoveOutcome::RejectedOccupied,
            Err(BoardError::OutOfBounds(_)) => return MoveOutcome::Ignored,
        }
        if let Some(reason) = forbidden_move(&self.board, pos, player, rule) {
            self.board.remove(pos);
            debug!(%pos, %player, %reason, "forbidden move reverted");
            self.observer.status(reason.message());
            return MoveOutcome::RejectedForbidden { reason };
        }

        self.last_move = Some(pos);
        self.move_history.push((pos, player));
        for cleared in self.board.clear_winning() {
            self.notify_cell(cleared);
        }
        self.notify_cell(pos);
        self.observer.stone_played(pos, player);

        if let Some(line) = winning_line(&self.board, pos, rule) {
            for &p in &line {
                self.board.set_winning(p, true);
                self.notify_cell(p);
            }
            self.game_over = Some(GameEnd {
                winner: Some(player),
                has_winner: true,
            });
            return MoveOutcome::Applied {
                winning_line: Some(line),
                is_draw: false,
            };
        }
        if self.board.is_full() {
            self.game_over = Some(GameEnd {
                winner: None,
                has_winner: false,
            });
            return MoveOutcome::Applied {
                winning_line: None,
                is_draw: true,
            };
        }

        self.maybe_expand(pos);
        self.current = player.opponent();
        MoveOutcome::Applied {
            winning_line: None,
            is_draw: false,
        }
    }

    /// Follow-up of an applied move: end the game or hand over the turn
    fn settle(&mut self, outcome: &MoveOutcome, snapshot: Option<MoveSnapshot>) {
        if !outcome.is_applied() {
            return;
        }
        match self.game_over {
            Some(end) => self.finish(end),
            None => self.schedule_opponent(snapshot),
        }
    }

    fn finish(&mut self, end: GameEnd) {
        info!(winner = ?end.winner, "game over");
        if self.observer.game_ended(&end) {
            self.new_match();
        }
    }

    fn notify_cell(&mut self, pos: Pos) {
        if let Some(cell) = self.board.cell(pos) {
            self.observer.cell_changed(pos, cell);
        }
    }

    /// Grow the board when `pos` is close to an edge (Freestyle, no engine)
    fn maybe_expand(&mut self, pos: Pos) {
        if !self.config.rule.allows_expansion() || self.engine_active() {
            return;
        }
        let edges = self.board.edges_near(pos, self.config.expansion.threshold);
        let mut grown = false;
        for edge in edges {
            if !self.board.expand(edge) {
                continue;
            }
            grown = true;
            match edge {
                Edge::Top => self.shift_positions(1, 0),
                Edge::Left => self.shift_positions(0, 1),
                Edge::Bottom | Edge::Right => {}
            }
            debug!(?edge, rows = self.board.rows(), cols = self.board.cols(), "board expanded");
        }
        if grown {
            self.observer.board_resized(self.board.rows(), self.board.cols());
        }
    }

    fn shift_positions(&mut self, dr: usize, dc: usize) {
        let shift = |p: Pos| Pos::new(p.row + dr, p.col + dc);
        self.last_move = self.last_move.map(shift);
        for (pos, _) in &mut self.move_history {
            *pos = shift(*pos);
        }
    }

    // Opponent dispatch

    /// Start computing the AI's move if it is the AI's turn
    fn schedule_opponent(&mut self, snapshot: Option<MoveSnapshot>) {
        if self.game_over.is_some() || self.is_thinking() || self.is_human_turn() {
            return;
        }
        let player = self.current;
        let receiver = match self.engine.take() {
            Some(bridge) => {
                let request = self.engine_request(player);
                spawn_engine(bridge, request)
            }
            None => self.spawn_heuristic(player),
        };
        self.observer.status("thinking...");
        self.opponent = OpponentState::Thinking {
            receiver,
            snapshot,
            start_time: Instant::now(),
        };
    }

    fn engine_request(&self, player: Player) -> EngineRequest {
        if self.board.is_board_empty() {
            return EngineRequest::Begin;
        }
        if self.engine_synced {
            if let Some(last) = self.last_move {
                if self.board.get(last) == Some(player.opponent()) {
                    return EngineRequest::Turn {
                        x: last.col,
                        y: last.row,
                    };
                }
            }
        }
        let stones = self
            .stone_order()
            .into_iter()
            .map(|(pos, owner)| (pos.col, pos.row, if owner == player { 1 } else { 2 }))
            .collect();
        EngineRequest::Board(stones)
    }

    /// Stones in play order when known, row-major otherwise
    fn stone_order(&self) -> Vec<(Pos, Player)> {
        if self.move_history.len() == self.board.stone_count() {
            self.move_history.clone()
        } else {
            self.board.stones().collect()
        }
    }

    fn last_opponent_move(&self, player: Player) -> Option<Pos> {
        let opponent = player.opponent();
        self.last_move
            .filter(|&pos| self.board.get(pos) == Some(opponent))
            .or_else(|| {
                self.move_history
                    .iter()
                    .rev()
                    .find(|(_, owner)| *owner == opponent)
                    .map(|(pos, _)| *pos)
            })
    }

    fn spawn_heuristic(&mut self, player: Player) -> Receiver<WorkerReply> {
        let board = self.board.clone();
        let tier = self.tier;
        let rule = self.config.rule;
        let last_opponent = self.last_opponent_move(player);
        let seed: u64 = self.rng.random();

        let (tx, rx) = channel();
        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let choice = select_move(tier, &board, player, last_opponent, rule, &mut rng);
            let _ = tx.send(WorkerReply::Heuristic(choice));
        });
        rx
    }

    fn resolve(&mut self, reply: WorkerReply) -> Option<MoveOutcome> {
        let OpponentState::Thinking {
            snapshot, start_time, ..
        } = mem::replace(&mut self.opponent, OpponentState::Idle)
        else {
            return None;
        };
        debug!(elapsed_ms = start_time.elapsed().as_millis() as u64, "opponent replied");

        match reply {
            WorkerReply::Heuristic(Some(pos)) => {
                let outcome = self.apply_move(pos);
                if !outcome.is_applied() {
                    warn!(%pos, ?outcome, "AI move not accepted");
                    self.observer.status("AI could not find a legal move");
                }
                self.settle(&outcome, None);
                Some(outcome)
            }
            WorkerReply::Heuristic(None) => {
                self.observer.status("AI could not find a move");
                None
            }
            WorkerReply::Engine { bridge, reply } => {
                self.engine = Some(bridge);
                self.resolve_engine(reply, snapshot)
            }
        }
    }

    fn resolve_engine(
        &mut self,
        reply: Result<EngineReply, EngineError>,
        snapshot: Option<MoveSnapshot>,
    ) -> Option<MoveOutcome> {
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                self.engine_failed(snapshot, &err.to_string());
                return None;
            }
        };
        if let Some(message) = &reply.message {
            info!(%message, "engine message");
            self.observer.status(message);
        }

        match reply.result {
            EngineMoveResult::Move { x, y } => {
                let pos = Pos::new(y, x);
                let outcome = self.apply_move(pos);
                if outcome.is_applied() {
                    self.engine_synced = true;
                    self.settle(&outcome, None);
                } else {
                    self.engine_failed(snapshot, &format!("engine move {pos} was not accepted"));
                }
                Some(outcome)
            }
            other => {
                self.engine_failed(snapshot, &describe(&other));
                None
            }
        }
    }

    /// The worker thread died without replying
    fn worker_lost(&mut self) {
        let OpponentState::Thinking { snapshot, .. } = mem::replace(&mut self.opponent, OpponentState::Idle)
        else {
            return;
        };
        warn!("opponent worker stopped without a reply");
        if self.engine_active() && self.engine.is_none() {
            self.engine_failed(snapshot, "engine worker stopped");
        } else {
            self.observer.status("AI error");
        }
    }

    /// Wait out an in-flight request and drop its reply.
    ///
    /// A heuristic worker is simply abandoned; an engine worker must hand
    /// the bridge back first.
    fn settle_worker(&mut self) {
        let OpponentState::Thinking { receiver, .. } = mem::replace(&mut self.opponent, OpponentState::Idle)
        else {
            return;
        };
        if !(self.engine_active() && self.engine.is_none()) {
            return;
        }
        match receiver.recv() {
            Ok(WorkerReply::Engine { bridge, .. }) => self.engine = Some(bridge),
            Ok(WorkerReply::Heuristic(_)) | Err(_) => self.degrade("engine worker stopped"),
        }
    }

    /// Send the engine a fresh `START` for the current board
    fn restart_engine(&mut self) {
        let (rows, cols, rule) = (self.board.rows(), self.board.cols(), self.config.rule);
        let restarted = self.engine.as_mut().map(|bridge| bridge.start(rows, cols, rule));
        if let Some(Err(err)) = restarted {
            self.degrade(&err.to_string());
        }
    }

    /// Engine failure during play: undo the move the engine was told
    /// about, drop professional mode and let the local AI continue
    fn engine_failed(&mut self, snapshot: Option<MoveSnapshot>, reason: &str) {
        if let Some(snapshot) = snapshot {
            self.rollback(snapshot);
        }
        self.degrade(reason);
        self.schedule_opponent(None);
    }

    fn rollback(&mut self, snapshot: MoveSnapshot) {
        if self.last_move != Some(snapshot.pos) {
            warn!(pos = %snapshot.pos, "stale snapshot, nothing rolled back");
            return;
        }
        self.board.remove(snapshot.pos);
        if let Some(occupant) = snapshot.prior_occupant {
            if let Err(err) = self.board.place(snapshot.pos, occupant) {
                debug!(%err, "prior occupant not restored");
            }
        }
        if self.move_history.last().map(|&(pos, _)| pos) == Some(snapshot.pos) {
            self.move_history.pop();
        }
        self.last_move = snapshot.prior_last_move;
        self.current = snapshot.prior_player;
        self.notify_cell(snapshot.pos);
        info!(pos = %snapshot.pos, player = %snapshot.prior_player, "move rolled back");
    }

    /// Shut the engine down for good and fall back to Hard
    fn degrade(&mut self, reason: &str) {
        if let Some(mut bridge) = self.engine.take() {
            bridge.shutdown();
        }
        self.tier = AiTier::Hard;
        self.engine_synced = false;
        warn!(reason, "external engine disabled");
        self.observer
            .status(&format!("engine unavailable ({reason}), {} AI takes over", self.tier));
    }
}

fn fresh_board(config: &MatchConfig) -> Board {
    Board::new(config.rows, config.cols).with_growth_limit(config.expansion.max_rows, config.expansion.max_cols)
}

fn spawn_engine(mut bridge: EngineBridge, request: EngineRequest) -> Receiver<WorkerReply> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let reply = match request {
            EngineRequest::Begin => bridge.begin(),
            EngineRequest::Turn { x, y } => bridge.turn(x, y),
            EngineRequest::Board(stones) => bridge.sync_board(stones),
        };
        // A dropped receiver drops the bridge, which shuts the engine down
        let _ = tx.send(WorkerReply::Engine { bridge, reply });
    });
    rx
}

fn describe(result: &EngineMoveResult) -> String {
    match result {
        EngineMoveResult::Move { x, y } => format!("unexpected move {x},{y}"),
        EngineMoveResult::Forbidden { .. } => "engine reported the move as forbidden".to_string(),
        EngineMoveResult::Illegal { .. } => "engine reported the move as illegal".to_string(),
        EngineMoveResult::Error { raw } => format!("engine error: {raw}"),
        EngineMoveResult::Ok => "unexpected OK from engine".to_string(),
        EngineMoveResult::InvalidResponse { raw } => format!("invalid engine reply '{raw}'"),
        EngineMoveResult::NoResponse => "engine closed its output".to_string(),
    }
}
