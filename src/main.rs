//! `imgfs` maintains a miniature Unix-style filesystem stored inside a
//! single host file and runs an interactive shell over it.

mod shell;

use fs::FileSystem;
use std::env;
use std::path::Path;
use std::process::exit;

/// Prints command usage.
fn print_usage() {
    println!("Usage: imgfs <file_name> <size_in_bytes>");
    println!("       imgfs <file_name>");
    println!();
    println!("The two-argument form creates a fresh image, truncating the file;");
    println!("the one-argument form opens an existing image.");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let fs = match args.as_slice() {
        [image] => FileSystem::open(Path::new(image)),
        [image, size] => match size.parse::<u64>() {
            Ok(size) => FileSystem::format(Path::new(image), size),
            Err(_) => {
                print_usage();
                exit(0);
            }
        },
        _ => {
            print_usage();
            exit(0);
        }
    };
    let mut fs = fs.unwrap_or_else(|e| {
        eprintln!("imgfs: {e}");
        exit(1);
    });
    shell::run(&mut fs);
}
