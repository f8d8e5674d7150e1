/// One-pole DC blocker: `y[n] = x[n] - x[n-1] + f * y[n-1]`.
#[derive(Clone, Copy, Debug)]
pub struct DcBlocker {
    coefficient: f32,
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    pub const DEFAULT_COEFFICIENT: f32 = 0.9995;

    pub fn new(coefficient: f32) -> Self {
        Self {
            coefficient,
            x1: 0.0,
            y1: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x1 + self.coefficient * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COEFFICIENT)
    }
}
