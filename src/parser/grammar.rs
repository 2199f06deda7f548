//! Cell address grammar using chumsky
//!
//! ```text
//! address  := "cell:" ( "this" | sign count filter? | count filter? )
//! sign     := "+" | "-"
//! filter   := ":md" | ":cd"
//! ```

use chumsky::prelude::*;

use crate::error::AddressError;
use crate::notebook::{CellAddress, CellKind};

/// Parse a cell-reference key such as `cell:-1:md` into an address
pub fn parse_address(input: &str) -> Result<CellAddress, Vec<AddressError>> {
    address_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn address_parser<'a>() -> impl Parser<'a, &'a str, CellAddress, extra::Err<Rich<'a, char>>> + Clone
{
    let kind_filter = just(':')
        .ignore_then(choice((
            just("md").to(CellKind::Markup),
            just("cd").to(CellKind::Code),
        )))
        .labelled("type filter")
        .or_not();

    let count = text::int(10)
        .try_map(|digits: &str, span| {
            digits
                .parse::<usize>()
                .map_err(|e| Rich::custom(span, format!("cell number out of range: {}", e)))
        })
        .labelled("cell number");

    let this = just("this").to(CellAddress::This);

    let sign = choice((just('+').to(1isize), just('-').to(-1isize)));

    let relative = sign
        .then(count.clone())
        .then(kind_filter.clone())
        .try_map(|((sign, steps), kind), span| {
            let steps = isize::try_from(steps)
                .map_err(|_| Rich::custom(span, "relative offset out of range"))?;
            Ok(CellAddress::Relative {
                offset: sign * steps,
                kind,
            })
        });

    let absolute = count
        .then(kind_filter)
        .map(|(position, kind)| CellAddress::Absolute { position, kind });

    just("cell:")
        .ignore_then(choice((this, relative, absolute)))
        .then_ignore(end())
}
