use anyhow::Result;
use is_terminal::IsTerminal;
use std::io;

use rowset::evaluate::evaluate;
use rowset::operands::{load, Operand};
use rowset::record::{write_records, Record};

fn main() -> Result<()> {
    let args = rowset::args::parsed()?;
    if args.show_tree {
        eprintln!("{}", args.expression);
    }

    let operands = load(&args.inputs)?;
    let collections: Vec<Vec<Record>> = operands.iter().map(Operand::records).collect();
    let result = evaluate(&args.expression, &collections);

    let mask = args.expression.mask;
    if io::stdout().is_terminal() {
        write_records(&mut io::stdout().lock(), &result, mask, &args.output_separator)?;
    } else {
        let mut out = io::BufWriter::new(io::stdout().lock());
        write_records(&mut out, &result, mask, &args.output_separator)?;
    };
    Ok(())
}
