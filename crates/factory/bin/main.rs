//! The `singleton-factory` CLI: deterministic deployment of the singleton CREATE2 factory.

use singleton_factory::args::run;
use singleton_factory_common::errors::exit_code;

fn main() {
    if let Err(err) = run() {
        let _ = singleton_factory_common::sh_err!("{err:?}");
        std::process::exit(exit_code(&err));
    }
}
