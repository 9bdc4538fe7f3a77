mod harness;
mod loader;
