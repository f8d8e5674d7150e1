use std::f32::consts::TAU;

use crate::cell::{CellAllocator, Cells};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    X,
    Y,
    Z,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    Cvx,
    Cvy,
    Cvz,
    Ax,
    Ay,
    Az,
    Bx,
    By,
    Bz,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    Ax,
    Ay,
    Az,
    Bx,
    By,
    Bz,
}

type Matrix = [[f32; 3]; 3];

/// Rotation by Euler angles, applied x first, then y, then z.
fn rotation(x: f32, y: f32, z: f32) -> Matrix {
    let (sx, cx) = x.sin_cos();
    let (sy, cy) = y.sin_cos();
    let (sz, cz) = z.sin_cos();
    [
        [cz * cy, cz * sy * sx - sz * cx, cz * sy * cx + sz * sx],
        [sz * cy, sz * sy * sx + cz * cx, sz * sy * cx - cz * sx],
        [-sy, cy * sx, cy * cx],
    ]
}

fn apply(m: &Matrix, v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Rotates two 3-vectors (`a`, `b`) by the same angles.
///
/// Each angle is `(control + cv)` turns.
pub struct Rotor {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
}

impl Rotor {
    pub fn new(alloc: &mut CellAllocator) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
        }
    }

    fn angle(&self, cells: &Cells, ctrl: Control, cv: Input) -> f32 {
        (self.ctrl.load(cells, ctrl) + self.inputs.load(cells, cv)) * TAU
    }

    fn vector(&self, cells: &Cells, ports: [Input; 3]) -> [f32; 3] {
        ports.map(|p| self.inputs.load(cells, p))
    }
}

impl Module for Rotor {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Rotor
    }

    fn process(&mut self, cells: &Cells) {
        let m = rotation(
            self.angle(cells, Control::X, Input::Cvx),
            self.angle(cells, Control::Y, Input::Cvy),
            self.angle(cells, Control::Z, Input::Cvz),
        );

        let a = apply(&m, self.vector(cells, [Input::Ax, Input::Ay, Input::Az]));
        let b = apply(&m, self.vector(cells, [Input::Bx, Input::By, Input::Bz]));

        for (port, value) in [Output::Ax, Output::Ay, Output::Az].into_iter().zip(a) {
            self.outputs.store(cells, port, value);
        }
        for (port, value) in [Output::Bx, Output::By, Output::Bz].into_iter().zip(b) {
            self.outputs.store(cells, port, value);
        }
    }

    fn reset(&mut self) {}

    port_tables!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Indexed;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn zero_angles_pass_through() {
        let m = rotation(0.0, 0.0, 0.0);
        assert!(approx(apply(&m, [0.3, -0.2, 0.9]), [0.3, -0.2, 0.9]));
    }

    #[test]
    fn quarter_turn_about_z_maps_x_to_y() {
        let m = rotation(0.0, 0.0, TAU / 4.0);
        assert!(approx(apply(&m, [1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]));
    }

    #[test]
    fn rotation_preserves_length() {
        let m = rotation(0.3, 1.1, -2.0);
        let v = apply(&m, [1.0, 2.0, 2.0]);
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!((len - 3.0).abs() < 1e-4);
    }

    #[test]
    fn cv_adds_to_control_angle() {
        let mut alloc = CellAllocator::new();
        let mut rotor = Rotor::new(&mut alloc);
        let ctrl_z = alloc.alloc(0.125);
        let cv_z = alloc.alloc(0.125);
        let ax = alloc.alloc(1.0);
        let cells = alloc.finish();
        rotor.controls_mut()[Control::Z.index()] = ctrl_z;
        rotor.inputs_mut()[Input::Cvz.index()] = cv_z;
        rotor.inputs_mut()[Input::Ax.index()] = ax;

        rotor.process(&cells);
        let out = |p: Output| cells.load(rotor.outputs()[p.index()]);
        assert!(out(Output::Ax).abs() < 1e-5);
        assert!((out(Output::Ay) - 1.0).abs() < 1e-5);
        assert_eq!(out(Output::Bx), 0.0);
    }
}
