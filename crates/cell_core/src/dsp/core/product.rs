use crate::cell::{CellAllocator, Cells};
use crate::types::{Indexed, Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    A,
    B,
    C,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    Out,
}

/// Three-input blend stage: the product of whichever inputs are patched.
///
/// With nothing patched the output is `0.0`, not the empty product.
pub struct Product {
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
}

impl Product {
    pub fn new(alloc: &mut CellAllocator) -> Self {
        Self {
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
        }
    }
}

impl Module for Product {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Product
    }

    fn process(&mut self, cells: &Cells) {
        let mut any = false;
        let mut product = 1.0;
        for port in Input::ALL {
            if !self.inputs.is_unpatched(*port) {
                product *= self.inputs.load(cells, *port);
                any = true;
            }
        }
        self.outputs
            .store(cells, Output::Out, if any { product } else { 0.0 });
    }

    fn reset(&mut self) {}

    port_tables!(no_controls);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_only_patched_inputs() {
        let mut alloc = CellAllocator::new();
        let mut pct = Product::new(&mut alloc);
        let a = alloc.alloc(0.5);
        let c = alloc.alloc(-4.0);
        let cells = alloc.finish();
        let out = pct.outputs()[Output::Out.index()];

        pct.process(&cells);
        assert_eq!(cells.load(out), 0.0);

        pct.inputs_mut()[Input::A.index()] = a;
        pct.process(&cells);
        assert_eq!(cells.load(out), 0.5);

        pct.inputs_mut()[Input::C.index()] = c;
        pct.process(&cells);
        assert_eq!(cells.load(out), -2.0);
    }
}
