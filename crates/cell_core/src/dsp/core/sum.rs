use crate::cell::{CellAllocator, Cells};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    A,
    B,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    Sum,
    Difference,
}

/// Two-input summing stage: `a + b` and `a - b`.
pub struct Sum {
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
}

impl Sum {
    pub fn new(alloc: &mut CellAllocator) -> Self {
        Self {
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
        }
    }
}

impl Module for Sum {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Sum
    }

    fn process(&mut self, cells: &Cells) {
        let a = self.inputs.load(cells, Input::A);
        let b = self.inputs.load(cells, Input::B);
        self.outputs.store(cells, Output::Sum, a + b);
        self.outputs.store(cells, Output::Difference, a - b);
    }

    fn reset(&mut self) {}

    port_tables!(no_controls);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Indexed;

    #[test]
    fn sums_and_differences() {
        let mut alloc = CellAllocator::new();
        let mut sum = Sum::new(&mut alloc);
        let a = alloc.alloc(0.75);
        let b = alloc.alloc(0.25);
        let cells = alloc.finish();
        sum.inputs_mut()[Input::A.index()] = a;
        sum.inputs_mut()[Input::B.index()] = b;

        sum.process(&cells);
        assert_eq!(cells.load(sum.outputs()[Output::Sum.index()]), 1.0);
        assert_eq!(cells.load(sum.outputs()[Output::Difference.index()]), 0.5);
    }
}
