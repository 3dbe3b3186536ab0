pub mod mix_up;
