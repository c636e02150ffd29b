pub mod heston;
