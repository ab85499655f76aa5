//! Component-level tests, one file per module under `tests/unit/`.

mod unit;
