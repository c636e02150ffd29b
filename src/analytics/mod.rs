pub mod cir_moments;
