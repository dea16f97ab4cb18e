//! Runnable examples for the `meta-cache` crate, see the `examples/` directory.
