//! # Wikicorpus
//!
//! Builds labeled bilingual text corpora out of the Wikipedia category graph.
//!
//! ## Getting started
//!
//! ```sh
//! wikicorpus 0.3.0
//! labeled bilingual corpora from the Wikipedia category graph.
//!
//! USAGE:
//!     wikicorpus <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     corpus    Collect a bilingual corpus
//!     help      Prints this message or the help of the given subcommand(s)
//!     tree      Build the category tree and map it onto primary categories
//! ```
//!
//! A typical run builds the tree once, then collects corpora using its subcategory map:
//!
//! ```sh
//! wikicorpus tree out/ --max-level 10 --primary-level 2
//! wikicorpus corpus v0_1 out/ -1 en -2 fr --map out/subcat2cat_10-2.json --seed 1
//! ```
use log::debug;
use structopt::StructOpt;
use wikicorpus::error::Error;
use wikicorpus::fetch::WikiApi;
use wikicorpus::pipelines::{CorpusAssembler, Pipeline, TreePipeline};
use wikicorpus::tree::SubcatMap;

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::Wikicorpus::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Wikicorpus::Tree(t) => {
            let api = WikiApi::new(&t.api_lang)?;
            let p = TreePipeline::new(
                &api,
                t.roots(),
                t.dst.clone(),
                t.name.clone(),
                t.params(),
                t.primary_level,
            )
            .with_resume(t.resume());
            p.run()?;
        }

        cli::Wikicorpus::Corpus(c) => {
            let api = WikiApi::new(c.api_lang())?;
            let map = SubcatMap::load_optional(c.map.as_deref())?;
            let p = CorpusAssembler::new(&api, c.dst.clone(), c.params()?).with_map(map);
            p.run()?;
        }
    };
    Ok(())
}
