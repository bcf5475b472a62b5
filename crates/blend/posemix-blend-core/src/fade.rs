//! Crossfade controller: drives the normalized blend-time parameter and turns
//! it into the scalar weights the layering pass consumes.

use crate::curve::BlendCurve;

const FADED_OUT_EPS: f32 = 1e-4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FadeState {
    Idle,
    BlendingIn,
    BlendingOut,
}

/// Owned crossfade state. Progress is monotonic within one fade; duration and
/// curve are configured at asset activation and reused by a later blend-out.
#[derive(Clone, Debug)]
pub struct Crossfade {
    state: FadeState,
    playback: f32,
    duration: f32,
    curve: Option<BlendCurve>,
    /// Cached-vs-active blend weight fed to the layering pass. Holds its last
    /// value outside of BlendingIn.
    weight: f32,
}

impl Crossfade {
    pub fn new() -> Self {
        Self {
            state: FadeState::Idle,
            playback: 0.0,
            duration: 0.0,
            curve: None,
            weight: 1.0,
        }
    }

    #[inline]
    pub fn state(&self) -> FadeState {
        self.state
    }

    /// Set the duration and easing used by subsequent fades.
    pub fn configure(&mut self, duration: f32, curve: Option<BlendCurve>) {
        self.duration = duration.max(0.0);
        self.curve = curve;
    }

    /// Start blending the active asset in from the cached pose.
    /// A zero-length duration is instantaneous.
    pub fn begin(&mut self) {
        self.playback = 0.0;
        if self.duration <= 0.0 {
            self.state = FadeState::Idle;
            self.weight = 1.0;
        } else {
            self.state = FadeState::BlendingIn;
            self.weight = self.eval(0.0);
        }
    }

    /// Start driving the active asset's global contribution toward zero.
    pub fn begin_out(&mut self) {
        self.playback = 0.0;
        self.state = FadeState::BlendingOut;
    }

    /// Apply the new asset immediately, no cache involved.
    pub fn snap(&mut self) {
        self.state = FadeState::Idle;
        self.playback = self.duration;
        self.weight = 1.0;
    }

    /// Advance fade playback. Clamped, so progress never regresses.
    pub fn advance(&mut self, dt: f32) {
        if self.state == FadeState::Idle {
            return;
        }
        self.playback = (self.playback + dt).clamp(0.0, self.duration);
        if self.state == FadeState::BlendingIn {
            self.weight = self.eval(self.progress());
            if self.progress() >= 1.0 {
                // Fully active; weights are no longer touched until the next
                // switch.
                self.state = FadeState::Idle;
            }
        }
    }

    /// Normalized fade progress. Zero-length fades are already complete.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.playback / self.duration).clamp(0.0, 1.0)
    }

    /// Crossfade weight between cached (0) and active (1) poses.
    #[inline]
    pub fn blend_weight(&self) -> f32 {
        self.weight
    }

    /// Global contribution multiplier; ramps 1 -> 0 during BlendingOut.
    pub fn fade_out_weight(&self) -> f32 {
        if self.state == FadeState::BlendingOut {
            1.0 - self.eval(self.progress())
        } else {
            1.0
        }
    }

    /// Terminal condition for BlendingOut: contribution has reached zero.
    pub fn is_faded_out(&self) -> bool {
        self.state == FadeState::BlendingOut && self.fade_out_weight() <= FADED_OUT_EPS
    }

    /// Reset to idle after the active asset has been cleared.
    pub fn finish_out(&mut self) {
        self.state = FadeState::Idle;
        self.weight = 1.0;
    }

    #[inline]
    fn eval(&self, t: f32) -> f32 {
        match &self.curve {
            Some(curve) => curve.evaluate(t),
            None => t,
        }
    }
}

impl Default for Crossfade {
    fn default() -> Self {
        Self::new()
    }
}
