mod common;
mod conditions;
