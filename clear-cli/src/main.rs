//! Clear VM launcher — load a compiled module and run it.
//!
//! One positional argument: the module path stem. The launcher appends
//! `.clr.b`, reads the file, decodes it, and executes it. `print` output
//! and `||`-prefixed diagnostics both go to stdout.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage, read, or decode error
//! - 2: Runtime fault

use std::fs;
use std::io;
use std::process;

use clear_common::Module;
use clear_vm::Vm;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("Incorrect usage: Please pass a module stem to run");
        println!("Usage: clearvm <module>   (reads <module>.clr.b)");
        process::exit(1);
    }

    let path = format!("{}.clr.b", args[1]);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("|| cannot read '{path}': {e}");
            process::exit(1);
        }
    };

    if bytes.is_empty() {
        println!("|| '{path}' contains no instructions");
        process::exit(1);
    }

    let module = match Module::decode(&bytes) {
        Ok(module) => module,
        Err(e) => {
            println!("|| {e}");
            process::exit(1);
        }
    };

    #[cfg(feature = "dis")]
    {
        println!("\nDisassembling:\n```");
        print!("{}", clear_disasm::disassemble(&module));
        println!("```");
    }

    let mut stdout = io::stdout();
    let mut vm = Vm::new(&module, &mut stdout);

    println!("\nRunning:\n```");
    let result = vm.execute();
    println!("```");

    #[cfg(feature = "mem-stats")]
    {
        let stats = vm.heap_stats();
        println!(
            "|| allocated {} objects ({} payload bytes)",
            stats.objects, stats.payload_bytes
        );
    }

    match result {
        Ok(()) => process::exit(0),
        Err(fault) => {
            println!("|| {fault}");
            process::exit(2);
        }
    }
}
