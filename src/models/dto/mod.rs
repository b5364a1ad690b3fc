pub mod model_output;
