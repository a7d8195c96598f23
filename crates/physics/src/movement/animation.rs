//! Action animation selection.
//!
//! The body's locomotion state decides which full-body action should play.
//! The simulation only picks actions and drives the ledge climb-up clip;
//! blending and skinning belong to whatever implements [`AnimationPlayer`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::constants::{
    CONTACT_TICK_TIME, TRANSITION_CLIMB, TRANSITION_DEFAULT, TRANSITION_JUMP, TRANSITION_LAND,
    TRANSITION_LEDGE, TRANSITION_STOP,
};
use super::config::PlayerConfig;
use super::events::{EventSink, LocomotionEvent};
use super::jump::JumpType;
use super::state::{DamageState, MoveDir, PlayerBody, SimState};

/// Minimum speed for a directional climb, ledge or wall animation.
const TRAVERSE_ANIM_SPEED: f32 = 0.1;

/// Minimum body-frame speed for a ground locomotion animation.
const GROUND_ANIM_SPEED: f32 = 0.01;

/// Full-body action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Nothing playing; the next update picks an action.
    #[default]
    Null,
    Root,
    RunForward,
    WalkForward,

    Fall,
    Jump,
    StandJump,
    StandingLand,
    RunningLand,

    Death1,
    Stop,

    WallIdle,
    WallLeft,
    WallRight,

    LedgeIdle,
    LedgeLeft,
    LedgeRight,
    LedgeUp,

    ClimbIdle,
    ClimbUp,
    ClimbDown,
    ClimbLeft,
    ClimbRight,

    SlideFront,
    SlideBack,
}

impl Action {
    pub const ALL: [Action; 25] = [
        Action::Null,
        Action::Root,
        Action::RunForward,
        Action::WalkForward,
        Action::Fall,
        Action::Jump,
        Action::StandJump,
        Action::StandingLand,
        Action::RunningLand,
        Action::Death1,
        Action::Stop,
        Action::WallIdle,
        Action::WallLeft,
        Action::WallRight,
        Action::LedgeIdle,
        Action::LedgeLeft,
        Action::LedgeRight,
        Action::LedgeUp,
        Action::ClimbIdle,
        Action::ClimbUp,
        Action::ClimbDown,
        Action::ClimbLeft,
        Action::ClimbRight,
        Action::SlideFront,
        Action::SlideBack,
    ];

    /// Wire index.
    pub fn index(self) -> u8 {
        // Declaration order matches ALL
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Name of the clip that plays this action. `Null` has none.
    pub fn sequence_name(self) -> Option<&'static str> {
        let name = match self {
            Action::Null => return None,
            Action::Root => "root",
            Action::RunForward => "run",
            Action::WalkForward => "walk",
            Action::Fall => "fall",
            Action::Jump => "jump",
            Action::StandJump => "standjump",
            Action::StandingLand => "land",
            Action::RunningLand => "jumpland",
            Action::Death1 => "death1",
            Action::Stop => "stop",
            Action::WallIdle => "wallidle",
            Action::WallLeft => "wallleft",
            Action::WallRight => "wallright",
            Action::LedgeIdle => "ledgeidle",
            Action::LedgeLeft => "ledgeleft",
            Action::LedgeRight => "ledgeright",
            Action::LedgeUp => "ledgeup",
            Action::ClimbIdle => "climbidle",
            Action::ClimbUp => "climbup",
            Action::ClimbDown => "climbdown",
            Action::ClimbLeft => "climbleft",
            Action::ClimbRight => "climbright",
            Action::SlideFront => "slidefront",
            Action::SlideBack => "slideback",
        };
        Some(name)
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Action::Jump | Action::StandJump)
    }

    pub fn is_land(self) -> bool {
        matches!(self, Action::StandingLand | Action::RunningLand)
    }

    pub fn is_ledge(self) -> bool {
        matches!(
            self,
            Action::LedgeIdle | Action::LedgeLeft | Action::LedgeRight | Action::LedgeUp
        )
    }

    pub fn is_climb(self) -> bool {
        matches!(
            self,
            Action::ClimbIdle | Action::ClimbUp | Action::ClimbDown | Action::ClimbLeft | Action::ClimbRight
        )
    }

    /// Blend time into this action (seconds).
    pub fn transition_time(self) -> f32 {
        if self.is_land() {
            TRANSITION_LAND
        } else if self.is_jump() {
            TRANSITION_JUMP
        } else if self.is_ledge() {
            TRANSITION_LEDGE
        } else if self.is_climb() {
            TRANSITION_CLIMB
        } else if self == Action::Stop {
            TRANSITION_STOP
        } else {
            TRANSITION_DEFAULT
        }
    }
}

// ============================================================================
// Animation player
// ============================================================================

/// Handle to a clip inside an [`AnimationPlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub u32);

/// The single action thread of an animated body.
///
/// Positions are normalized: 0 is the first frame, 1 the last.
pub trait AnimationPlayer {
    fn find_sequence(&self, name: &str) -> Option<SequenceId>;

    /// Blend from whatever is playing into `sequence`, starting at `position`.
    fn transition_to(&mut self, sequence: SequenceId, position: f32, time_scale: f32, transition_time: f32);

    fn position(&self) -> f32;
    fn set_position(&mut self, position: f32);
    fn in_transition(&self) -> bool;
    fn clear_transition(&mut self);

    /// Advance playback by `dt` seconds.
    fn advance(&mut self, dt: f32);
}

/// A clip known to a [`ClipPlayer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,

    /// Length in seconds at time scale 1.
    pub duration: f32,

    /// Wraps around instead of stopping at either end.
    pub cyclic: bool,
}

impl Clip {
    pub fn new(name: impl Into<String>, duration: f32, cyclic: bool) -> Self {
        Self {
            name: name.into(),
            duration,
            cyclic,
        }
    }
}

/// Timeline-only [`AnimationPlayer`]. Tracks clip position and blend time
/// without producing any pose.
#[derive(Debug, Clone, Default)]
pub struct ClipPlayer {
    clips: Vec<Clip>,
    by_name: HashMap<String, SequenceId>,
    current: Option<SequenceId>,
    position: f32,
    time_scale: f32,
    transition_remaining: f32,
}

impl ClipPlayer {
    pub fn new(clips: Vec<Clip>) -> Self {
        let by_name = clips
            .iter()
            .enumerate()
            .map(|(i, clip)| (clip.name.clone(), SequenceId(i as u32)))
            .collect();
        Self {
            clips,
            by_name,
            ..Default::default()
        }
    }

    /// One clip for every action.
    pub fn standard() -> Self {
        let clips = Action::ALL
            .iter()
            .filter_map(|&action| {
                let name = action.sequence_name()?;
                let (duration, cyclic) = match action {
                    Action::Root
                    | Action::RunForward
                    | Action::WalkForward
                    | Action::Fall
                    | Action::WallIdle
                    | Action::LedgeIdle
                    | Action::ClimbIdle
                    | Action::SlideFront
                    | Action::SlideBack => (1.0, true),
                    Action::WallLeft
                    | Action::WallRight
                    | Action::LedgeLeft
                    | Action::LedgeRight
                    | Action::ClimbUp
                    | Action::ClimbDown
                    | Action::ClimbLeft
                    | Action::ClimbRight => (0.8, true),
                    Action::StandingLand | Action::RunningLand => (0.3, false),
                    Action::Death1 => (1.5, false),
                    _ => (0.5, false),
                };
                Some(Clip::new(name, duration, cyclic))
            })
            .collect();
        Self::new(clips)
    }

    /// Clip currently on the thread.
    pub fn current(&self) -> Option<&Clip> {
        self.current.and_then(|id| self.clips.get(id.0 as usize))
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }
}

impl AnimationPlayer for ClipPlayer {
    fn find_sequence(&self, name: &str) -> Option<SequenceId> {
        self.by_name.get(name).copied()
    }

    fn transition_to(&mut self, sequence: SequenceId, position: f32, time_scale: f32, transition_time: f32) {
        self.current = Some(sequence);
        self.position = position.clamp(0.0, 1.0);
        self.time_scale = time_scale;
        self.transition_remaining = transition_time.max(0.0);
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn set_position(&mut self, position: f32) {
        self.position = position.clamp(0.0, 1.0);
    }

    fn in_transition(&self) -> bool {
        self.transition_remaining > 0.0
    }

    fn clear_transition(&mut self) {
        self.transition_remaining = 0.0;
    }

    fn advance(&mut self, dt: f32) {
        self.transition_remaining = (self.transition_remaining - dt).max(0.0);

        let Some(clip) = self.current() else {
            return;
        };
        if clip.duration <= 0.0 {
            return;
        }
        let cyclic = clip.cyclic;
        let pos = self.position + dt * self.time_scale / clip.duration;
        self.position = if cyclic { pos.rem_euclid(1.0) } else { pos.clamp(0.0, 1.0) };
    }
}

// ============================================================================
// Action thread
// ============================================================================

/// The action currently on the body's action thread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionAnimation {
    pub action: Action,
    pub forward: bool,

    /// Stay on the last frame once finished.
    pub hold_at_end: bool,

    /// Keep the action until it finishes instead of re-picking each tick.
    pub wait_for_end: bool,

    pub at_end: bool,

    /// Start from the current clip position when switching between two
    /// synched actions (walk and run).
    pub use_synched_pos: bool,

    /// `AnimationFinished` was already raised for this action.
    pub callback_tripped: bool,

    /// `None` when the player has no clip for the action.
    #[serde(skip)]
    pub sequence: Option<SequenceId>,
}

impl Default for ActionAnimation {
    fn default() -> Self {
        Self {
            action: Action::Null,
            forward: true,
            hold_at_end: false,
            wait_for_end: false,
            at_end: false,
            use_synched_pos: false,
            callback_tripped: false,
            sequence: None,
        }
    }
}

impl ActionAnimation {
    /// Drop the current action; the next update picks a new one.
    pub fn cancel(&mut self) {
        self.action = Action::Null;
        self.wait_for_end = false;
    }
}

/// Arguments to [`set_action`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionRequest {
    pub action: Action,
    pub forward: bool,
    pub hold: bool,
    pub wait: bool,
    pub synched: bool,
    pub force: bool,
}

impl ActionRequest {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            forward: true,
            hold: false,
            wait: false,
            synched: false,
            force: false,
        }
    }

    pub fn wait(mut self) -> Self {
        self.wait = true;
        self
    }

    pub fn hold(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn synched(mut self) -> Self {
        self.synched = true;
        self
    }

    /// Restart even if the same action is already playing.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.forward = false;
        self
    }
}

/// Put an action on the thread. Returns false if it was already playing in
/// the same direction.
pub fn set_action(state: &mut ActionAnimation, player: &mut dyn AnimationPlayer, request: ActionRequest) -> bool {
    let action = request.action;
    if state.action == action && state.forward == request.forward && !request.force {
        return false;
    }

    let reversing = state.action == action && state.forward != request.forward;
    let both_synched = state.use_synched_pos && request.synched;

    *state = ActionAnimation {
        action,
        forward: request.forward,
        hold_at_end: request.hold,
        wait_for_end: request.hold || request.wait,
        at_end: false,
        use_synched_pos: request.synched,
        callback_tripped: false,
        sequence: None,
    };

    let Some(name) = action.sequence_name() else {
        return true;
    };
    let Some(sequence) = player.find_sequence(name) else {
        log::warn!("no animation sequence '{}' for {:?}", name, action);
        state.at_end = true;
        return true;
    };
    state.sequence = Some(sequence);

    let position = if reversing || both_synched {
        player.position()
    } else if request.forward {
        0.0
    } else {
        1.0
    };

    // The climb-up clip is driven by hand
    let time_scale = match (action, request.forward) {
        (Action::LedgeUp, _) => 0.0,
        (_, true) => 1.0,
        (_, false) => -1.0,
    };

    player.transition_to(sequence, position, time_scale, action.transition_time());
    true
}

/// Choose the action that fits the body's current state.
pub fn pick_action(body: &PlayerBody, config: &PlayerConfig) -> ActionRequest {
    if body.mounted {
        return ActionRequest::new(Action::Root);
    }

    let speed = body.velocity.length();
    let moving = speed >= TRAVERSE_ANIM_SPEED;

    let action = if body.damage != DamageState::Enabled {
        Action::Death1
    } else if body.ledge.active && body.ledge.climbing_up {
        Action::LedgeUp
    } else if body.ledge.active {
        match body.ledge.direction {
            MoveDir::Left if moving => Action::LedgeLeft,
            MoveDir::Right if moving => Action::LedgeRight,
            _ => Action::LedgeIdle,
        }
    } else if body.climb.active {
        match body.climb.direction {
            MoveDir::Up if moving => Action::ClimbUp,
            MoveDir::Down if moving => Action::ClimbDown,
            MoveDir::Left if moving => Action::ClimbLeft,
            MoveDir::Right if moving => Action::ClimbRight,
            _ => Action::ClimbIdle,
        }
    } else if body.wall_hug.active {
        match body.wall_hug.direction {
            MoveDir::Left if moving => Action::WallLeft,
            MoveDir::Right if moving => Action::WallRight,
            _ => Action::WallIdle,
        }
    } else if body.slide.active {
        if body.slide.normal.dot(body.forward()) < 0.0 {
            Action::SlideBack
        } else {
            Action::SlideFront
        }
    } else if body.falling {
        Action::Fall
    } else if body.jump.active {
        match body.jump.jump_type {
            JumpType::Run => Action::Jump,
            JumpType::Stand => Action::StandJump,
        }
    } else if body.contact_timer >= CONTACT_TICK_TIME {
        Action::Root
    } else {
        let local = body.local_velocity();
        if local.length() > GROUND_ANIM_SPEED && local.y > 0.5 {
            let action = if speed > config.walk_run_anim_velocity {
                Action::RunForward
            } else {
                Action::WalkForward
            };
            return ActionRequest::new(action).synched();
        }
        Action::Root
    };

    ActionRequest::new(action)
}

/// Refresh the end flag, re-pick the action when allowed, and report held
/// actions that finished. Returns true if the action changed.
pub fn update_action_thread(
    body: &mut PlayerBody,
    config: &PlayerConfig,
    player: &mut dyn AnimationPlayer,
    events: &mut dyn EventSink,
) -> bool {
    let anim = &mut body.action;
    if anim.action != Action::Null {
        anim.at_end = match anim.sequence {
            None => true,
            Some(_) if anim.forward => player.position() >= 1.0,
            Some(_) => player.position() <= 0.0,
        };
    }

    if anim.wait_for_end && anim.at_end && !anim.callback_tripped {
        anim.callback_tripped = true;
        events.emit(LocomotionEvent::AnimationFinished(anim.action));
    }

    if body.sim_state != SimState::Move {
        return false;
    }

    let anim = &body.action;
    let repick = anim.action == Action::Null || !anim.wait_for_end || (anim.at_end && !anim.hold_at_end);
    if !repick {
        return false;
    }

    let request = pick_action(body, config);
    let before = body.action.action;
    set_action(&mut body.action, player, request);
    body.action.action != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn body() -> PlayerBody {
        PlayerBody::new(Vec3::ZERO, &PlayerConfig::default())
    }

    #[test]
    fn test_action_index_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_index(action.index()), Some(action));
        }
        assert_eq!(Action::from_index(Action::ALL.len() as u8), None);
    }

    #[test]
    fn test_transition_times() {
        assert_eq!(Action::RunningLand.transition_time(), TRANSITION_LAND);
        assert_eq!(Action::StandJump.transition_time(), TRANSITION_JUMP);
        assert_eq!(Action::LedgeUp.transition_time(), TRANSITION_LEDGE);
        assert_eq!(Action::ClimbLeft.transition_time(), TRANSITION_CLIMB);
        assert_eq!(Action::Stop.transition_time(), TRANSITION_STOP);
        assert_eq!(Action::Root.transition_time(), TRANSITION_DEFAULT);
    }

    #[test]
    fn test_clip_player_transitions_and_clamps() {
        let mut player = ClipPlayer::standard();
        let land = player.find_sequence("land").unwrap();

        player.transition_to(land, 0.0, 1.0, 0.05);
        assert!(player.in_transition());
        player.advance(0.032);
        assert!(player.in_transition());
        player.advance(0.032);
        assert!(!player.in_transition());

        // 0.3 s clip, non-cyclic
        for _ in 0..20 {
            player.advance(0.032);
        }
        assert_eq!(player.position(), 1.0);

        let run = player.find_sequence("run").unwrap();
        player.transition_to(run, 0.9, 1.0, 0.25);
        player.clear_transition();
        assert!(!player.in_transition());
        player.advance(0.2);
        assert!((player.position() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_set_action_skips_same_direction() {
        let mut player = ClipPlayer::standard();
        let mut state = ActionAnimation::default();

        assert!(set_action(&mut state, &mut player, ActionRequest::new(Action::Fall)));
        assert!(!set_action(&mut state, &mut player, ActionRequest::new(Action::Fall)));
        assert!(set_action(&mut state, &mut player, ActionRequest::new(Action::Fall).force()));
        assert!(set_action(&mut state, &mut player, ActionRequest::new(Action::Fall).reversed()));
        assert!(!state.forward);
    }

    #[test]
    fn test_synched_switch_keeps_clip_position() {
        let mut player = ClipPlayer::standard();
        let mut state = ActionAnimation::default();

        set_action(&mut state, &mut player, ActionRequest::new(Action::WalkForward).synched());
        player.set_position(0.4);
        set_action(&mut state, &mut player, ActionRequest::new(Action::RunForward).synched());
        assert!((player.position() - 0.4).abs() < 1e-6);

        set_action(&mut state, &mut player, ActionRequest::new(Action::Root));
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn test_missing_sequence_is_at_end() {
        let mut player = ClipPlayer::new(vec![Clip::new("root", 1.0, true)]);
        let mut state = ActionAnimation::default();

        assert!(set_action(&mut state, &mut player, ActionRequest::new(Action::Stop).wait()));
        assert_eq!(state.action, Action::Stop);
        assert_eq!(state.sequence, None);
        assert!(state.at_end);
    }

    #[test]
    fn test_ledge_up_clip_does_not_self_advance() {
        let mut player = ClipPlayer::standard();
        let mut state = ActionAnimation::default();
        set_action(&mut state, &mut player, ActionRequest::new(Action::LedgeUp));
        player.advance(1.0);
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn test_pick_action_priority() {
        let config = PlayerConfig::default();
        let mut b = body();
        assert_eq!(pick_action(&b, &config).action, Action::Root);

        b.velocity = Vec3::new(0.0, 1.0, 0.0);
        let request = pick_action(&b, &config);
        assert_eq!(request.action, Action::WalkForward);
        assert!(request.synched);

        b.velocity = Vec3::new(0.0, 5.0, 0.0);
        assert_eq!(pick_action(&b, &config).action, Action::RunForward);

        // Sideways motion keeps the root pose
        b.velocity = Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(pick_action(&b, &config).action, Action::Root);

        b.jump.active = true;
        b.jump.jump_type = JumpType::Stand;
        assert_eq!(pick_action(&b, &config).action, Action::StandJump);

        b.falling = true;
        assert_eq!(pick_action(&b, &config).action, Action::Fall);

        // Surface states never overlap, so each one is set on its own
        b.wall_hug.active = true;
        b.wall_hug.direction = MoveDir::Left;
        assert_eq!(pick_action(&b, &config).action, Action::WallLeft);
        b.wall_hug.active = false;

        b.climb.active = true;
        b.climb.direction = MoveDir::Down;
        assert_eq!(pick_action(&b, &config).action, Action::ClimbDown);
        b.climb.active = false;

        b.ledge.active = true;
        b.ledge.anim_pos = 0.3;
        b.ledge.direction = MoveDir::Right;
        assert_eq!(pick_action(&b, &config).action, Action::LedgeRight);

        b.ledge.climbing_up = true;
        assert_eq!(pick_action(&b, &config).action, Action::LedgeUp);

        // Reversed all the way out of the climb-up
        b.ledge.climbing_up = false;
        b.ledge.anim_pos = 0.0;
        b.ledge.direction = MoveDir::None;
        assert_eq!(pick_action(&b, &config).action, Action::LedgeIdle);

        b.damage = DamageState::Disabled;
        assert_eq!(pick_action(&b, &config).action, Action::Death1);
    }

    #[test]
    fn test_slow_traversal_picks_idle() {
        let config = PlayerConfig::default();
        let mut b = body();
        b.climb.active = true;
        b.climb.direction = MoveDir::Up;
        b.velocity = Vec3::new(0.0, 0.0, 0.05);
        assert_eq!(pick_action(&b, &config).action, Action::ClimbIdle);
    }

    #[test]
    fn test_waiting_action_reports_finish_once() {
        let config = PlayerConfig::default();
        let mut player = ClipPlayer::standard();
        let mut b = body();
        let mut events = Vec::new();

        set_action(&mut b.action, &mut player, ActionRequest::new(Action::StandingLand).wait());

        // Mid-clip: keeps the land action
        player.advance(0.1);
        assert!(!update_action_thread(&mut b, &config, &mut player, &mut events));
        assert_eq!(b.action.action, Action::StandingLand);
        assert!(events.is_empty());

        player.advance(1.0);
        assert!(update_action_thread(&mut b, &config, &mut player, &mut events));
        assert_eq!(events, vec![LocomotionEvent::AnimationFinished(Action::StandingLand)]);
        assert_eq!(b.action.action, Action::Root);
    }

    #[test]
    fn test_held_action_stays_after_finish() {
        let config = PlayerConfig::default();
        let mut player = ClipPlayer::standard();
        let mut b = body();
        let mut events = Vec::new();

        set_action(&mut b.action, &mut player, ActionRequest::new(Action::Death1).hold());
        player.advance(5.0);

        update_action_thread(&mut b, &config, &mut player, &mut events);
        update_action_thread(&mut b, &config, &mut player, &mut events);
        assert_eq!(b.action.action, Action::Death1);
        assert_eq!(events.len(), 1);
    }
}
