use asm8::config::{parse_offset, parse_size, Config, Format};
use asm8::error::{Diag, Error};
use asm8::rom::RomSize;
use asm8::source::Source;
use asm8::template::{render, DEFAULT_TEMPLATE};
use asm8::{assemble, listing};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input files, assembled in order
    #[clap(required = true)]
    input: Vec<String>,

    /// Output file [default: a.out, or a.vhd for vhdl]
    #[clap(short, long)]
    output: Option<String>,

    /// Load address in hex [default: E000]
    #[clap(long, value_parser = parse_offset)]
    offset: Option<u16>,

    /// ROM size in bytes, or `auto`
    #[clap(short, long, value_parser = parse_size)]
    size: Option<RomSize>,

    /// Label the reset vector points to
    #[clap(short, long)]
    entry: Option<String>,

    /// Output format
    #[clap(short, long, value_enum)]
    format: Option<Format>,

    /// VHDL template file
    #[clap(short, long)]
    template: Option<String>,

    /// YAML config file
    #[clap(short, long)]
    config: Option<String>,

    /// Write the symbol table as YAML
    #[clap(long)]
    symbols: Option<String>,

    /// Dump assembly code
    #[clap(short, long)]
    dump: bool,
}

impl Args {
    fn overrides(&self) -> Config {
        Config {
            offset: self.offset,
            size: self.size,
            entry: self.entry.clone(),
            output: self.output.clone(),
            format: self.format,
            template: self.template.clone(),
            symbols: self.symbols.clone(),
        }
    }
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("8-bit CPU Assembler");

    let config = match &args.config {
        Some(path) => Config::load(path).map(|file| file.merge(args.overrides())),
        None => Ok(args.overrides()),
    };
    let config = config.unwrap_or_else(|e| fail(&Source::new(), e.into()));

    println!("1. Read Files");
    for path in &args.input {
        println!("  < {}", path);
    }
    let source = Source::load(&args.input).unwrap_or_else(|diag| fail(&Source::new(), diag));

    if let Err(diag) = run(&config, &source, args.dump) {
        fail(&source, diag);
    }
}

fn run(config: &Config, source: &Source, dump: bool) -> Result<(), Diag> {
    let options = config.options();

    println!("2. Assemble at ${:04X}", options.offset);
    let asm = assemble(source, &options)?;
    println!("  - found #{} labels", asm.symbols.len());
    println!("  - {} bytes of code", asm.code.size());
    if let Some(size) = options.size {
        println!("  - ROM {} ({} bytes), reset -> ${:04X}", size, asm.image.len(), asm.entry);
    }

    println!("3. Output");
    let output = config.output();
    println!("  > {}", output);
    match config.format() {
        Format::Bin => write(&output, &asm.image)?,
        Format::Vhdl => {
            let template = match &config.template {
                Some(path) => std::fs::read_to_string(path)
                    .map_err(|e| Error::FileOpen(path.clone(), e))?,
                None => DEFAULT_TEMPLATE.to_string(),
            };
            write(&output, render(&template, &asm.image)?.as_bytes())?;
        }
    }
    if let Some(path) = &config.symbols {
        println!("  > {}", path);
        write(path, asm.symbols.to_yaml()?.as_bytes())?;
    }

    if dump {
        print!("{}", listing::dump(source, &asm.stmts, &asm.code));
    }
    Ok(())
}

fn write(path: &str, bytes: &[u8]) -> Result<(), Error> {
    std::fs::write(path, bytes).map_err(|e| Error::FileWrite(path.to_string(), e))
}

fn fail(source: &Source, diag: Diag) -> ! {
    diag.print(source);
    std::process::exit(1)
}
