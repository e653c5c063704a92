use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::types::{ElectionDetail, Field, LocationDirectory, PartyVotes};

static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("invalid selector: row"));

static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: cell"));

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("invalid selector: table"));

static LOCATION_CODE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.cislo").expect("invalid selector: location code"));

static LOCATION_NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td.overflow_name").expect("invalid selector: location name")
});

static SUMMARY_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#ps311_t1").expect("invalid selector: summary table"));

static PARTY_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.t2_470").expect("invalid selector: party block"));

const SUMMARY_ROW: usize = 2;
const SUMMARY_MIN_CELLS: usize = 8;
const REGISTERED_VOTERS_CELL: usize = 3;
const ISSUED_ENVELOPES_CELL: usize = 4;
const VALID_VOTES_CELL: usize = 7;

const PARTY_HEADER_ROWS: usize = 2;
const PARTY_NAME_CELL: usize = 1;
const PARTY_VOTES_CELL: usize = 2;

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Trimmed cell text with the non-breaking spaces used as thousands
/// separators removed.
fn number_text(element: ElementRef) -> String {
    elem_text(element).trim().replace('\u{a0}', "")
}

pub fn parse_location_directory_html(html: &str) -> LocationDirectory {
    parse_location_directory(&Html::parse_document(html))
}

/// Collects every table row carrying both a municipality code cell and a
/// name cell. Rows whose code is not a number are skipped.
pub fn parse_location_directory(document: &Html) -> LocationDirectory {
    let mut directory = LocationDirectory::new();

    for row in document.select(&ROW) {
        let (Some(code_cell), Some(name_cell)) = (
            row.select(&LOCATION_CODE).next(),
            row.select(&LOCATION_NAME).next(),
        ) else {
            continue;
        };

        let code_text = elem_text(code_cell);
        match code_text.trim().parse::<u32>() {
            Ok(code) => directory.insert(code, elem_text(name_cell).trim().to_string()),
            Err(e) => log::debug!("Skipping location row with code '{}': {}", code_text.trim(), e),
        }
    }

    directory
}

pub fn parse_election_detail_html(html: &str) -> ElectionDetail {
    parse_election_detail(&Html::parse_document(html))
}

/// Reads the summary counters and per-party votes of one municipality.
///
/// Missing tables, short rows and unreadable counts never fail the parse; the
/// affected values stay unavailable.
pub fn parse_election_detail(document: &Html) -> ElectionDetail {
    let mut detail = ElectionDetail::default();

    if let Some(summary) = document.select(&SUMMARY_TABLE).next() {
        parse_summary(summary, &mut detail);
    } else {
        log::debug!("No summary table found");
    }

    detail.party_votes = parse_party_votes(document);
    detail
}

fn parse_summary(table: ElementRef, detail: &mut ElectionDetail) {
    let Some(row) = table.select(&ROW).nth(SUMMARY_ROW) else {
        log::debug!("Summary table has fewer than {} rows", SUMMARY_ROW + 1);
        return;
    };

    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.len() < SUMMARY_MIN_CELLS {
        log::debug!(
            "Summary row has {} cells, expected at least {}",
            cells.len(),
            SUMMARY_MIN_CELLS
        );
        return;
    }

    detail.registered_voters = Field::Present(number_text(cells[REGISTERED_VOTERS_CELL]));
    detail.issued_envelopes = Field::Present(number_text(cells[ISSUED_ENVELOPES_CELL]));
    detail.valid_votes = Field::Present(number_text(cells[VALID_VOTES_CELL]));
}

/// Sums the votes of every party row in the results blocks. Rows whose count is
/// not a number (the `-` padding rows, for one) are dropped, so such a party
/// gets no column unless another row gives it a count.
fn parse_party_votes(document: &Html) -> PartyVotes {
    let mut votes = PartyVotes::new();

    for block in document.select(&PARTY_BLOCK) {
        for table in block.select(&TABLE) {
            for row in table.select(&ROW).skip(PARTY_HEADER_ROWS) {
                let cells: Vec<ElementRef> = row.select(&CELL).collect();
                if cells.len() <= PARTY_VOTES_CELL {
                    continue;
                }

                let party = elem_text(cells[PARTY_NAME_CELL]).trim().to_string();
                let count_text = number_text(cells[PARTY_VOTES_CELL]);
                match count_text.parse::<u64>() {
                    Ok(count) => votes = merge_party_vote(votes, &party, count),
                    Err(e) => {
                        log::debug!("Skipping votes '{}' for party '{}': {}", count_text, party, e)
                    }
                }
            }
        }
    }

    votes
}

/// Adds `count` to the votes already recorded for `party`, inserting the party
/// if it is new.
///
/// Results of one municipality can be split over several sub-tables, so the
/// same party may show up more than once.
pub fn merge_party_vote(mut votes: PartyVotes, party: &str, count: u64) -> PartyVotes {
    let total = votes.entry(party.to_string()).or_default();
    *total = total.saturating_add(count);
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn detail_page(summary: &str, blocks: &[&str]) -> String {
        let blocks = blocks
            .iter()
            .map(|b| format!(r#"<div class="t2_470">{}</div>"#, b))
            .collect::<String>();
        format!("<html><body>{}{}</body></html>", summary, blocks)
    }

    fn party_table(rows: &[(&str, &str)]) -> String {
        let body = rows
            .iter()
            .enumerate()
            .map(|(i, (name, votes))| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>1,00</td></tr>",
                    i + 1,
                    name,
                    votes
                )
            })
            .collect::<String>();
        format!(
            "<table><tr><th>Strana</th><th>Platné hlasy</th></tr>\
             <tr><th>číslo</th><th>název</th><th>celkem</th><th>v %</th></tr>{}</table>",
            body
        )
    }

    #[test]
    fn test_merge_party_vote_inserts_and_sums() {
        let votes = merge_party_vote(PartyVotes::new(), "P", 100);
        assert_eq!(votes.get("P"), Some(&100));

        let votes = merge_party_vote(votes, "P", 250);
        assert_eq!(votes.get("P"), Some(&350));
        assert_eq!(votes.len(), 1);
    }

    #[test]
    fn test_merge_party_vote_keeps_other_parties() {
        let votes = merge_party_vote(PartyVotes::new(), "A", 1);
        let votes = merge_party_vote(votes, "B", 2);
        let votes = merge_party_vote(votes, "A", 3);

        assert_eq!(votes.get("A"), Some(&4));
        assert_eq!(votes.get("B"), Some(&2));
    }

    #[test]
    fn test_parse_location_directory_from_fixture() {
        let html = fs::read_to_string("fixtures/ps32_prostejov.html")
            .expect("Failed to read fixture");

        let directory = parse_location_directory_html(&html);

        assert_eq!(directory.len(), 4);
        let first = directory.iter().next().expect("at least one location");
        assert_eq!(first.code, 589268);
        assert_eq!(first.name, "Alojzov");
        assert_eq!(
            directory.get(589276).map(|l| l.name.as_str()),
            Some("Bedihošť")
        );
        for location in &directory {
            println!("{}", location);
        }
    }

    #[test]
    fn test_parse_location_directory_skips_unqualified_rows() {
        let html = r#"
            <table>
                <tr><th>číslo</th><th>název</th></tr>
                <tr><td class="cislo">abc</td><td class="overflow_name">Hlavička</td></tr>
                <tr><td class="cislo">506761</td></tr>
                <tr><td class="overflow_name">Bez kódu</td></tr>
                <tr><td class="cislo"> 506770 </td><td class="overflow_name"> Býkovice </td></tr>
            </table>
        "#;

        let directory = parse_location_directory_html(html);

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get(506770).map(|l| l.name.as_str()), Some("Býkovice"));
    }

    #[test]
    fn test_parse_location_directory_last_duplicate_wins() {
        let html = r#"
            <table>
                <tr><td class="cislo">1</td><td class="overflow_name">První</td></tr>
                <tr><td class="cislo">2</td><td class="overflow_name">Druhá</td></tr>
                <tr><td class="cislo">1</td><td class="overflow_name">Přepsaná</td></tr>
            </table>
        "#;

        let directory = parse_location_directory_html(html);

        let names: Vec<&str> = directory.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Přepsaná", "Druhá"]);
    }

    #[test]
    fn test_parse_location_directory_empty() {
        let directory = parse_location_directory_html("<html><body><p>Nic</p></body></html>");
        assert!(directory.is_empty());
    }

    #[test]
    fn test_parse_election_detail_from_fixture() {
        let html = fs::read_to_string("fixtures/ps311_alojzov.html")
            .expect("Failed to read fixture");

        let detail = parse_election_detail_html(&html);

        assert_eq!(detail.registered_voters, Field::Present("205".to_string()));
        assert_eq!(detail.issued_envelopes, Field::Present("145".to_string()));
        assert_eq!(detail.valid_votes, Field::Present("144".to_string()));
        assert_eq!(detail.party_votes.len(), 6);
        assert_eq!(detail.party_votes.get("Občanská demokratická strana"), Some(&29));
        assert_eq!(detail.party_votes.get("ANO 2011"), Some(&43));
    }

    #[test]
    fn test_summary_strips_non_breaking_spaces() {
        let summary = "<table id=\"ps311_t1\">\
            <tr><th>a</th></tr><tr><th>b</th></tr>\
            <tr><td>1</td><td>1</td><td>100,00</td><td>1\u{a0}205</td>\
            <td> 845 </td><td>845</td><td>70,12</td><td>2\u{a0}840\u{a0}</td><td>99,76</td></tr>\
            </table>";

        let detail = parse_election_detail_html(&detail_page(summary, &[]));

        assert_eq!(detail.registered_voters, Field::Present("1205".to_string()));
        assert_eq!(detail.issued_envelopes, Field::Present("845".to_string()));
        assert_eq!(detail.valid_votes, Field::Present("2840".to_string()));
        assert!(detail.party_votes.is_empty());
    }

    #[test]
    fn test_missing_summary_table_leaves_counters_unavailable() {
        let detail = parse_election_detail_html(&detail_page(
            "",
            &[&party_table(&[("ANO 2011", "10")])],
        ));

        assert_eq!(detail.registered_voters, Field::Unavailable);
        assert_eq!(detail.issued_envelopes, Field::Unavailable);
        assert_eq!(detail.valid_votes, Field::Unavailable);
        assert_eq!(detail.party_votes.get("ANO 2011"), Some(&10));
    }

    #[test]
    fn test_short_summary_row_leaves_counters_unavailable() {
        let summary = r#"<table id="ps311_t1">
            <tr><th>a</th></tr><tr><th>b</th></tr>
            <tr><td>1</td><td>2</td><td>3</td><td>4</td><td>5</td></tr>
        </table>"#;

        let detail = parse_election_detail_html(&detail_page(summary, &[]));
        assert_eq!(detail.registered_voters, Field::Unavailable);
        assert_eq!(detail.issued_envelopes, Field::Unavailable);
        assert_eq!(detail.valid_votes, Field::Unavailable);
    }

    #[test]
    fn test_summary_table_with_too_few_rows() {
        let summary = r#"<table id="ps311_t1"><tr><th>a</th></tr><tr><td>1</td></tr></table>"#;

        let detail = parse_election_detail_html(&detail_page(summary, &[]));
        assert_eq!(detail, ElectionDetail::default());
    }

    #[test]
    fn test_party_split_across_sub_tables_is_summed() {
        let left = party_table(&[("P", "100"), ("Q", "7")]);
        let right = party_table(&[("P", "250")]);

        let two_column_block = format!("{}{}", left, right);

        let detail = parse_election_detail_html(&detail_page("", &[&two_column_block]));

        assert_eq!(detail.party_votes.get("P"), Some(&350));
        assert_eq!(detail.party_votes.get("Q"), Some(&7));
    }

    #[test]
    fn test_party_split_across_blocks_is_summed() {
        let detail = parse_election_detail_html(&detail_page(
            "",
            &[
                &party_table(&[("P", "1\u{a0}000")]),
                &party_table(&[("P", "24")]),
            ],
        ));

        assert_eq!(detail.party_votes.get("P"), Some(&1024));
    }

    #[test]
    fn test_party_rows_with_too_few_cells_or_bad_counts_are_skipped() {
        let table = "<table><tr><th>h1</th></tr><tr><th>h2</th></tr>\
            <tr><td>1</td><td>Krátký řádek</td></tr>\
            <tr><td>2</td><td>Pomlčka</td><td>-</td></tr>\
            <tr><td>3</td><td>Piráti</td><td>42</td></tr></table>";

        let detail = parse_election_detail_html(&detail_page("", &[table]));

        assert_eq!(detail.party_votes.len(), 1);
        assert_eq!(detail.party_votes.get("Piráti"), Some(&42));
    }

    #[test]
    fn test_tables_outside_result_blocks_are_ignored() {
        let html = format!(
            "<html><body>{}</body></html>",
            party_table(&[("Mimo blok", "5")])
        );

        let detail = parse_election_detail_html(&html);
        assert!(detail.party_votes.is_empty());
    }
}
