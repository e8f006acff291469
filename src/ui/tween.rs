use crate::overlay::sequencer::Timing;
use crate::overlay::RenderSnapshot;
use std::time::Duration;

/// `cubic-bezier(0.77, 0, 0.18, 1)`, the card's slide curve.
pub fn ease(t: f32) -> f32 {
    cubic_bezier(0.77, 0.0, 0.18, 1.0, t)
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    let bez = |a: f32, b: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a + 3.0 * inv * s * s * b + s * s * s
    };
    let slope = |a: f32, b: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * a + 6.0 * inv * s * (b - a) + 3.0 * s * s * (1.0 - b)
    };

    // Newton on x(s) = x, bisection fallback when the slope flattens.
    let mut s = x;
    for _ in 0..8 {
        let dx = bez(x1, x2, s) - x;
        if dx.abs() < 1e-5 {
            return bez(y1, y2, s);
        }
        let d = slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s = (s - dx / d).clamp(0.0, 1.0);
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = x;
    for _ in 0..32 {
        let v = bez(x1, x2, s);
        if (v - x).abs() < 1e-5 {
            break;
        }
        if v < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bez(y1, y2, s)
}

/// One animated scalar heading towards a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    start: Duration,
    duration: Duration,
}

impl Tween {
    pub fn settled(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            start: Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Head for `to`, starting from wherever the value is right now.
    pub fn retarget(&mut self, to: f32, now: Duration, duration: Duration) {
        if to == self.to {
            return;
        }
        self.from = self.value(now);
        self.to = to;
        self.start = now;
        self.duration = duration;
    }

    pub fn jump(&mut self, to: f32) {
        *self = Self::settled(to);
    }

    pub fn value(&self, now: Duration) -> f32 {
        if self.duration.is_zero() || now >= self.start + self.duration {
            return self.to;
        }
        let t = now.saturating_sub(self.start).as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * ease(t)
    }
}

/// Interpolated values for one drawn frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampled {
    pub container_offset: f32,
    pub container_width: f32,
    pub text_opacity: f32,
    pub crossfade: f32,
}

/// Tracks the latest snapshot and eases between successive targets.
pub struct Animator {
    timing: Timing,
    offset: Tween,
    width: Tween,
    text_opacity: Tween,
    crossfade: Tween,
}

impl Animator {
    pub fn new(timing: Timing, first: &RenderSnapshot) -> Self {
        Self {
            timing,
            offset: Tween::settled(first.container_offset),
            width: Tween::settled(first.container_width),
            text_opacity: Tween::settled(first.text_opacity),
            crossfade: Tween::settled(first.crossfade_opacity),
        }
    }

    pub fn apply(&mut self, snap: &RenderSnapshot, now: Duration) {
        self.offset.retarget(snap.container_offset, now, self.timing.transition);
        self.width.retarget(snap.container_width, now, self.timing.transition);
        self.text_opacity.retarget(snap.text_opacity, now, self.timing.text_fade);

        // A fresh new-layer starts invisible at once; only the reveal animates.
        if snap.crossfade_opacity < self.crossfade.target() {
            self.crossfade.jump(snap.crossfade_opacity);
        } else {
            self.crossfade.retarget(snap.crossfade_opacity, now, self.timing.text_fade);
        }
    }

    pub fn sample(&self, now: Duration) -> Sampled {
        Sampled {
            container_offset: self.offset.value(now),
            container_width: self.width.value(now),
            text_opacity: self.text_opacity.value(now),
            crossfade: self.crossfade.value(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_ease_endpoints_and_symmetry() {
        assert!(ease(0.0).abs() < 1e-3);
        assert!((ease(1.0) - 1.0).abs() < 1e-3);
        assert!(ease(0.25) < 0.25);
        assert!(ease(0.75) > 0.75);
        let mut last = 0.0;
        for i in 0..=20 {
            let v = ease(i as f32 / 20.0);
            assert!(v + 1e-3 >= last);
            last = v;
        }
    }

    #[test]
    fn test_tween_moves_then_settles() {
        let mut tw = Tween::settled(-192.0);
        tw.retarget(0.0, ms(100), ms(1000));
        assert_eq!(tw.value(ms(100)), -192.0);
        let mid = tw.value(ms(600));
        assert!(mid > -192.0 && mid < 0.0);
        assert_eq!(tw.value(ms(1100)), 0.0);
        assert_eq!(tw.value(ms(5000)), 0.0);
    }

    #[test]
    fn test_retarget_mid_flight_starts_from_current() {
        let mut tw = Tween::settled(0.0);
        tw.retarget(1.0, ms(0), ms(200));
        let at = tw.value(ms(100));
        tw.retarget(0.0, ms(100), ms(200));
        assert!((tw.value(ms(100)) - at).abs() < 1e-6);
    }
}
