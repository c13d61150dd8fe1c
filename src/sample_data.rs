//! Seed tree written on first open when `seed_sample_data` is set.

use crate::archive_model::{Case, Fund, Inventory};

fn case(id: &str, title: &str, number: &str, year: &str, description: &str) -> Case {
    Case {
        id: id.to_string(),
        title: title.to_string(),
        number: number.to_string(),
        year: year.to_string(),
        description: description.to_string(),
    }
}

pub fn sample_funds() -> Vec<Fund> {
    vec![
        Fund {
            id: "f1".to_string(),
            name: "Grand Masonic Lodge".to_string(),
            number: "F.1".to_string(),
            description: "Records on the history and activity of the Grand Lodge, 1875-1940".to_string(),
            start_year: "1875".to_string(),
            end_year: "1940".to_string(),
            inventories: vec![
                Inventory {
                    id: "i1".to_string(),
                    title: "Administrative records".to_string(),
                    number: "Inv.1".to_string(),
                    description: "Charters, meeting minutes, membership rolls".to_string(),
                    cases: vec![
                        case("c1", "Charter of the Grand Lodge", "C.1", "1875", "Founding charter and amendments"),
                        case("c2", "Minutes of the Lodge council", "C.2", "1875-1880", "Council session minutes"),
                    ],
                },
                Inventory {
                    id: "i2".to_string(),
                    title: "Ritual records".to_string(),
                    number: "Inv.2".to_string(),
                    description: "Ceremony descriptions and manuals".to_string(),
                    cases: vec![case("c3", "Initiation ceremony", "C.1", "1875", "First degree initiation manual")],
                },
            ],
        },
        Fund {
            id: "f2".to_string(),
            name: "Personal collection of Solomon Rabinovich".to_string(),
            number: "F.2".to_string(),
            description: "Private papers and correspondence, 1850-1915".to_string(),
            start_year: "1850".to_string(),
            end_year: "1915".to_string(),
            inventories: vec![Inventory {
                id: "i3".to_string(),
                title: "Personal correspondence".to_string(),
                number: "Inv.1".to_string(),
                description: "Letters to and from European lodges".to_string(),
                cases: vec![case("c4", "Correspondence with European lodges", "C.1", "1870-1880", "Incoming and outgoing letters")],
            }],
        },
    ]
}
