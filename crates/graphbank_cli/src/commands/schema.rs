//! Schema command implementation.

use graphbank_model::Schema;

/// Prints the account schema declaration.
pub fn run() {
    println!("{}", Schema::account().text());
}
