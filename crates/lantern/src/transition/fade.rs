//! Overlay fades.
//!
//! [`Fade`] is a plain value advanced by frame deltas and drives the loading
//! overlay of the scene sequencer. [`ScreenFadePlugin`] tweens a persistent
//! full-screen overlay on top of [`FadeRequest`] messages.

use std::time::Duration;

use app::LOG_UI;
use bevy::color::Alpha;
use bevy::math::curve::EaseFunction;
use bevy::picking::Pickable;
use bevy::prelude::*;
use bevy::ui::FocusPolicy;
use bevy_tweening::{AnimCompletedEvent, Tween, TweenAnim, TweeningPlugin, lens::Lens};
use serde::{Deserialize, Serialize};
use settings::SettingsArc;

use crate::preferences::TransitionSettings;

/// Easing curves for fades. All of them are monotonic on `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Apply the curve to a linear progress value.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Interpolates an alpha value from `from` to `to` over `duration` seconds.
///
/// Once the duration has elapsed the value is exactly `to`, never an
/// accumulated approximation of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl Fade {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Advance by one frame and return the alpha for that frame.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        self.alpha()
    }

    pub fn alpha(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = self.easing.apply(self.elapsed / self.duration);
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn target(&self) -> f32 {
        self.to
    }
}

/// Full-screen overlay used for the startup fade and for [`FadeRequest`]s.
#[derive(Component)]
pub struct ScreenFadeOverlay;

/// Fade the screen overlay from its current alpha to `target_alpha`.
#[derive(Message, Debug, Clone, Copy)]
pub struct FadeRequest {
    pub target_alpha: f32,
    pub duration: f32,
}

/// Sent once a requested fade has reached its target.
#[derive(Message, Debug, Clone, Copy)]
pub struct FadeFinished {
    pub alpha: f32,
}

impl From<Easing> for EaseFunction {
    fn from(easing: Easing) -> Self {
        match easing {
            Easing::Linear => EaseFunction::Linear,
            Easing::EaseIn => EaseFunction::QuadraticIn,
            Easing::EaseOut => EaseFunction::QuadraticOut,
            Easing::EaseInOut => EaseFunction::QuadraticInOut,
        }
    }
}

/// Tweens the alpha channel of a [`BackgroundColor`].
///
/// The end of the tween writes `end` itself so the overlay never settles on
/// an interpolated neighbour of the requested value.
#[derive(Clone, Copy, Debug)]
pub struct BackgroundAlphaLens {
    pub start: f32,
    pub end: f32,
}

impl BackgroundAlphaLens {
    pub fn alpha_at(&self, ratio: f32) -> f32 {
        if ratio >= 1.0 {
            return self.end;
        }
        self.start + (self.end - self.start) * ratio.max(0.0)
    }
}

impl Lens<BackgroundColor> for BackgroundAlphaLens {
    fn lerp(&mut self, mut target: Mut<BackgroundColor>, ratio: f32) {
        let alpha = self.alpha_at(ratio);
        target.0.set_alpha(alpha);
    }
}

#[derive(Component, Clone, Copy)]
struct ScreenFadeTarget(f32);

pub struct ScreenFadePlugin;

impl Plugin for ScreenFadePlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<TweeningPlugin>() {
            app.add_plugins(TweeningPlugin);
        }
        app.add_message::<FadeRequest>()
            .add_message::<FadeFinished>()
            .add_systems(
                Startup,
                (spawn_screen_fade_overlay, request_startup_fade).chain(),
            )
            .add_systems(Update, (start_requested_fades, finish_screen_fades).chain());
    }
}

fn spawn_screen_fade_overlay(mut commands: Commands) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        },
        BackgroundColor(Color::BLACK),
        GlobalZIndex(i32::MAX - 1),
        FocusPolicy::Pass,
        Pickable::IGNORE,
        ScreenFadeOverlay,
        Name::new("Screen Fade Overlay"),
    ));
}

/// The game starts on an opaque overlay and fades it in.
fn request_startup_fade(
    settings: Option<Res<SettingsArc<TransitionSettings>>>,
    mut requests: MessageWriter<FadeRequest>,
) {
    let duration = settings
        .map(|s| s.startup_fade_secs)
        .unwrap_or(TransitionSettings::default().startup_fade_secs);
    requests.write(FadeRequest {
        target_alpha: 0.0,
        duration,
    });
}

fn start_requested_fades(
    mut commands: Commands,
    settings: Option<Res<SettingsArc<TransitionSettings>>>,
    mut requests: MessageReader<FadeRequest>,
    overlay: Query<(Entity, &BackgroundColor), With<ScreenFadeOverlay>>,
    mut finished: MessageWriter<FadeFinished>,
) {
    // Only the latest request of a frame matters.
    let Some(request) = requests.read().last().copied() else {
        return;
    };
    let Ok((entity, color)) = overlay.single() else {
        return;
    };

    let target = request.target_alpha.clamp(0.0, 1.0);
    debug!(target: LOG_UI, "fading screen overlay to {target} over {}s", request.duration);

    if !request.duration.is_finite() || request.duration <= 0.0 {
        commands
            .entity(entity)
            .remove::<(TweenAnim, ScreenFadeTarget)>()
            .insert(BackgroundColor(color.0.with_alpha(target)));
        finished.write(FadeFinished { alpha: target });
        return;
    }

    let easing = settings.map(|s| s.easing).unwrap_or_default();
    let tween = Tween::new(
        EaseFunction::from(easing),
        Duration::from_secs_f32(request.duration),
        BackgroundAlphaLens {
            start: color.0.alpha(),
            end: target,
        },
    );
    commands
        .entity(entity)
        .insert((TweenAnim::new(tween), ScreenFadeTarget(target)));
}

fn finish_screen_fades(
    mut commands: Commands,
    mut completed: MessageReader<AnimCompletedEvent>,
    fades: Query<&ScreenFadeTarget, With<ScreenFadeOverlay>>,
    mut finished: MessageWriter<FadeFinished>,
) {
    for event in completed.read() {
        let Ok(target) = fades.get(event.anim_entity) else {
            continue;
        };
        finished.write(FadeFinished { alpha: target.0 });
        commands
            .entity(event.anim_entity)
            .remove::<(TweenAnim, ScreenFadeTarget)>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::curve::Curve;

    fn sample(mut fade: Fade, dt: f32, frames: usize) -> Vec<f32> {
        (0..frames).map(|_| fade.advance(dt)).collect()
    }

    #[test]
    fn fade_in_snaps_exactly_to_target() {
        let mut fade = Fade::new(0.0, 1.0, 0.5);
        let mut last = 0.0;
        // 0.1 is not exactly representable, so summing it drifts.
        for _ in 0..5 {
            last = fade.advance(0.1);
        }
        if !fade.is_finished() {
            last = fade.advance(0.1);
        }
        assert!(fade.is_finished());
        assert_eq!(last, 1.0);
    }

    #[test]
    fn fade_out_snaps_exactly_to_zero() {
        let samples = sample(Fade::new(1.0, 0.0, 1.0), 0.3, 4);
        assert_eq!(*samples.last().unwrap(), 0.0);
    }

    #[test]
    fn fades_are_monotonic_and_bounded() {
        for duration in [0.01, 0.25, 1.0, 3.7] {
            for easing in [
                Easing::Linear,
                Easing::EaseIn,
                Easing::EaseOut,
                Easing::EaseInOut,
            ] {
                let fade = Fade::new(0.2, 0.9, duration).with_easing(easing);
                let samples = sample(fade, 1.0 / 60.0, 300);
                let mut prev = 0.2;
                for alpha in samples {
                    assert!(alpha >= prev, "{easing:?} went backwards");
                    assert!((0.2 - 1e-6..=0.9 + 1e-6).contains(&alpha));
                    prev = alpha;
                }
                assert_eq!(prev, 0.9);
            }
        }
    }

    #[test]
    fn linear_samples_follow_elapsed_time() {
        let mut fade = Fade::new(0.0, 1.0, 2.0);
        let alpha = fade.advance(0.5);
        assert!((alpha - 0.25).abs() < 1e-6);
        let alpha = fade.advance(1.0);
        assert!((alpha - 0.75).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut fade = Fade::new(0.0, 1.0, 0.0);
        assert_eq!(fade.advance(0.016), 1.0);
        assert!(fade.is_finished());

        let mut negative = Fade::new(1.0, 0.0, -3.0);
        assert_eq!(negative.advance(0.0), 0.0);
    }

    #[test]
    fn alpha_lens_lands_on_the_exact_target() {
        let lens = BackgroundAlphaLens {
            start: 1.0,
            end: 0.3,
        };
        assert_eq!(lens.alpha_at(0.0), 1.0);
        assert!((lens.alpha_at(0.5) - 0.65).abs() < 1e-6);
        assert_eq!(lens.alpha_at(1.0), 0.3);
        assert_eq!(lens.alpha_at(1.2), 0.3);
    }

    #[test]
    fn easings_map_onto_matching_curves() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            let curve = EaseFunction::from(easing);
            for t in [0.1, 0.25, 0.5, 0.8] {
                assert!((curve.sample_clamped(t) - easing.apply(t)).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn bogus_deltas_do_not_move_the_fade() {
        let mut fade = Fade::new(0.0, 1.0, 1.0);
        assert_eq!(fade.advance(f32::NAN), 0.0);
        assert_eq!(fade.advance(-1.0), 0.0);
    }
}
