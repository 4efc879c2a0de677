//! Front-end driver: reads a source file, lexes, parses, and compiles
//! it to a `core::script::Script`, reporting the first syntax or
//! compile error exactly the way the front-end itself formats it.
//! There is no virtual machine wired in here -- running the compiled
//! script is the embedding host's job, not this binary's.

use std::error::Error;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use core::errors::{report, CompileError};
use core::tokens::TokenList;
use lexer::Lexer;

fn main() {
  let args = env::args().collect::<Vec<String>>();

  match args.as_slice() {
    [prog] => {
      eprintln!("usage: {} <script>", prog);
      std::process::exit(64);
    }
    [_, file] => run_file(file),
    [prog, ..] => {
      eprintln!("usage: {} <script>", prog);
      std::process::exit(64);
    }
  }
}

fn run_file(filename: &str) {
  let (path, source) = read_file(filename);
  let chars: Vec<char> = source.chars().collect();
  let mut byte_offsets: Vec<usize> = source.char_indices().map(|(i, _)| i).collect();
  byte_offsets.push(source.len());

  let tokens = Lexer::lex(&chars, &byte_offsets);
  let token_list = TokenList::new(&path, &source, &tokens);

  let (ast, root) = match parser::Parser::parse(&token_list) {
    Ok(parsed) => parsed,
    Err(e) => fail(&token_list, e),
  };

  match codegen::Generator::compile(&ast, root) {
    Ok((script, _arena)) => {
      println!(
        "compiled {} ({} proc{}, {} byte{} in the top-level chunk)",
        filename,
        script.procs.len(),
        if script.procs.len() == 1 { "" } else { "s" },
        script.main.len(),
        if script.main.len() == 1 { "" } else { "s" },
      );
    }
    Err(e) => fail(&token_list, e),
  }
}

fn fail(tokens: &TokenList, err: CompileError) -> ! {
  report(tokens, &err);
  std::process::exit(65);
}

fn read_file(filename: &str) -> (PathBuf, String) {
  match read_file_contents(filename) {
    Ok(src) => src,
    Err(error) => match error.downcast_ref::<io::Error>() {
      Some(e) => {
        match e.kind() {
          IoErrorKind::NotFound => eprintln!("File '{}' not found.", filename),
          IoErrorKind::PermissionDenied => eprintln!("Need permission to open '{}'.", filename),
          _ => eprintln!("Unexpected error when opening file '{}'.", filename),
        };
        match e.raw_os_error() {
          Some(code) => std::process::exit(code),
          None => std::process::exit(70),
        }
      }
      None => {
        eprintln!("Unexpected error when opening file '{}'.", filename);
        std::process::exit(70);
      }
    },
  }
}

fn read_file_contents(filename: &str) -> Result<(PathBuf, String), Box<dyn Error>> {
  let path = fs::canonicalize(filename)?;
  let contents = fs::read_to_string(filename)?;
  Ok((path, contents))
}
