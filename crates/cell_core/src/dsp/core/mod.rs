pub mod dc_block;
pub mod mixer;
pub mod product;
pub mod sum;
