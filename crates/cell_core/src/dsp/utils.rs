use std::f32::consts::TAU;

/// Linear blend: `f = 1` gives `a`, `f = 0` gives `b`.
#[inline]
pub fn crossfade(a: f32, b: f32, f: f32) -> f32 {
    a * f + b * (1.0 - f)
}

/// Folds a control in `[0, 1]` into a blend coefficient that peaks at `0.5`.
///
/// `0.0` and `1.0` map to `0.0`, `0.5` maps to `1.0`, linear in between.
#[inline]
pub fn fold_coefficient(a: f32) -> f32 {
    if a > 0.5 { (1.0 - a) * 2.0 } else { a * 2.0 }
}

/// Wrap a phase into `[0, 1)`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Octaves above C1 to Hz.
#[inline]
pub fn octaves_to_hz(octaves: f32) -> f32 {
    32.703_197 * octaves.exp2()
}

/// Moves `current` toward `target` by `amount`; one-pole parameter smoothing.
#[inline]
pub fn smooth_value(current: f32, target: f32, amount: f32) -> f32 {
    current + (target - current) * amount
}

/// The four basic shapes shared by the oscillators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

impl Waveform {
    /// Select by rounding a form control, clamped to the last shape.
    pub fn from_control(form: f32) -> Self {
        match form.round() as i32 {
            i32::MIN..=0 => Waveform::Sine,
            1 => Waveform::Triangle,
            2 => Waveform::Saw,
            _ => Waveform::Square,
        }
    }

    /// Bipolar sample of this shape at `phase` in `[0, 1)`. `width` is the
    /// pulse width of the square and is ignored by the other shapes.
    #[inline]
    pub fn sample(self, phase: f32, width: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < width {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Deterministic bipolar noise source.
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub const DEFAULT_SEED: u64 = 0x1234_5678_9abc_def0;

    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_bipolar(&mut self) -> f32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        let bits = (self.state >> 32) as u32;
        let value = bits as f32 / u32::MAX as f32;
        value * 2.0 - 1.0
    }
}

impl Default for LcgRng {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    None,
    Rising,
    Falling,
}

/// Detects crossings of a fixed threshold with hysteresis.
#[derive(Clone, Copy, Debug)]
pub struct SchmittTrigger {
    low_threshold: f32,
    high_threshold: f32,
    high: bool,
}

impl SchmittTrigger {
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            low_threshold,
            high_threshold,
            high: false,
        }
    }

    pub fn process(&mut self, input: f32) -> Edge {
        if !self.high && input >= self.high_threshold {
            self.high = true;
            Edge::Rising
        } else if self.high && input <= self.low_threshold {
            self.high = false;
            Edge::Falling
        } else {
            Edge::None
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn reset(&mut self) {
        self.high = false;
    }
}

impl Default for SchmittTrigger {
    fn default() -> Self {
        Self::new(0.1, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossfade_endpoints() {
        assert_eq!(crossfade(2.0, 5.0, 1.0), 2.0);
        assert_eq!(crossfade(2.0, 5.0, 0.0), 5.0);
        assert_eq!(crossfade(2.0, 4.0, 0.5), 3.0);
    }

    #[test]
    fn test_fold_coefficient() {
        assert_eq!(fold_coefficient(0.0), 0.0);
        assert_eq!(fold_coefficient(0.25), 0.5);
        assert_eq!(fold_coefficient(0.5), 1.0);
        assert_eq!(fold_coefficient(0.75), 0.5);
        assert_eq!(fold_coefficient(1.0), 0.0);
    }

    #[test]
    fn test_fold_coefficient_is_symmetric() {
        for i in 0..=50 {
            let a = i as f32 / 100.0;
            assert!((fold_coefficient(a) - fold_coefficient(1.0 - a)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(1.25) - 0.25).abs() < 1e-6);
        assert!((wrap_phase(-0.25) - 0.75).abs() < 1e-6);
        assert_eq!(wrap_phase(0.0), 0.0);
    }

    #[test]
    fn test_octaves_to_hz() {
        assert!((octaves_to_hz(0.0) - 32.703).abs() < 0.01);
        assert!((octaves_to_hz(3.0) - 261.63).abs() < 0.05);
    }

    #[test]
    fn test_waveform_selection_clamps() {
        assert_eq!(Waveform::from_control(-2.0), Waveform::Sine);
        assert_eq!(Waveform::from_control(1.4), Waveform::Triangle);
        assert_eq!(Waveform::from_control(2.0), Waveform::Saw);
        assert_eq!(Waveform::from_control(9.0), Waveform::Square);
    }

    #[test]
    fn test_waveforms_stay_bipolar() {
        for shape in [
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Saw,
            Waveform::Square,
        ] {
            for i in 0..100 {
                let v = shape.sample(i as f32 / 100.0, 0.5);
                assert!((-1.0..=1.0).contains(&v), "{shape:?} out of range: {v}");
            }
        }
    }

    #[test]
    fn test_lcg_is_bipolar_and_repeatable() {
        let mut a = LcgRng::default();
        let mut b = LcgRng::default();
        for _ in 0..1000 {
            let v = a.next_bipolar();
            assert!((-1.0..=1.0).contains(&v));
            assert_eq!(v, b.next_bipolar());
        }
    }

    #[test]
    fn test_schmitt_edges() {
        let mut trig = SchmittTrigger::default();
        assert_eq!(trig.process(0.0), Edge::None);
        assert_eq!(trig.process(1.0), Edge::Rising);
        assert_eq!(trig.process(0.3), Edge::None);
        assert!(trig.is_high());
        assert_eq!(trig.process(0.0), Edge::Falling);
    }
}
