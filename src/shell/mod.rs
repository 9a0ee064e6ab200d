//! The interactive command interpreter over an opened image.
//!
//! Each iteration prints the `:> ` prompt, reads one line and dispatches
//! the command. Name collisions during `upload` are reported on stdout as
//! regular output; other operation failures go to stderr and the session
//! continues.

use fs::{FileSystem, FsError};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Prints the command help text.
fn print_help() {
    println!("ls <dir> - prints dir content.");
    println!("upload <local_file> <virtual_file> - copies a local file into the file system.");
    println!("extract <virtual_file> <local_file> - extracts a virtual file into a local file.");
    println!("mkdir <path> - creates the missing directories along the path.");
    println!("extend <file> <bytes> - extends file size.");
    println!("truncate <file> <bytes> - truncates file size.");
    println!("df - prints file system usage.");
    println!("rm <file> - deletes a virtual file.");
    println!("h|help - shows this help text.");
}

/// Parses the byte-count argument of `extend` and `truncate`.
fn parse_bytes(cmd: &str, arg: &str) -> Option<u64> {
    match arg.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("{cmd}: invalid byte count `{arg}`");
            None
        }
    }
}

/// Runs the command loop until `exit` or the end of input.
pub fn run(fs: &mut FileSystem) {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!(":> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            continue;
        };
        let first = words.next().unwrap_or("");
        let second = words.next().unwrap_or("");

        let result = match cmd {
            "ls" => fs.ls(first).map(|listing| println!("{listing}")),
            "upload" => match fs.upload(Path::new(first), second) {
                Err(e @ FsError::NameExists) => {
                    println!("{e}");
                    Ok(())
                }
                res => res,
            },
            "extract" => fs.extract(first, Path::new(second)),
            "mkdir" => fs.mkdir(first),
            "rm" | "remove" => fs.rm(first),
            "extend" => match parse_bytes(cmd, second) {
                Some(bytes) => fs.extend(first, bytes),
                None => Ok(()),
            },
            "truncate" => match parse_bytes(cmd, second) {
                Some(bytes) => fs.truncate(first, bytes),
                None => Ok(()),
            },
            "df" => {
                println!("{}", fs.df());
                Ok(())
            }
            "help" | "h" => {
                print_help();
                Ok(())
            }
            "exit" => return,
            _ => Ok(()),
        };
        if let Err(e) = result {
            eprintln!("{e}");
        }
    }
}
