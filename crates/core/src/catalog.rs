use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown query `{name}`")]
pub struct UnknownQueryError {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("query name must not be empty")]
    EmptyName,
    #[error("query `{0}` is declared more than once")]
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub sql: String,
}

/// Named, predefined queries in presentation order.
///
/// Built once at startup and shared by reference; there is no way to mutate
/// a catalog after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCatalog {
    entries: Vec<CatalogEntry>,
}

impl QueryCatalog {
    pub fn new<N, S>(entries: impl IntoIterator<Item = (N, S)>) -> Result<Self, CatalogError>
    where
        N: Into<String>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut collected = Vec::new();
        for (name, sql) in entries {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if !seen.insert(name.clone()) {
                return Err(CatalogError::DuplicateName(name));
            }
            collected.push(CatalogEntry {
                name,
                sql: sql.into(),
            });
        }

        Ok(Self { entries: collected })
    }

    /// The tennis schema browser queries.
    #[must_use]
    pub fn tennis_default() -> Self {
        Self {
            entries: TENNIS_QUERIES
                .iter()
                .map(|(name, sql)| CatalogEntry {
                    name: (*name).to_string(),
                    sql: (*sql).to_string(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn get_sql(&self, name: &str) -> Result<&str, UnknownQueryError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.sql.as_str())
            .ok_or_else(|| UnknownQueryError {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.entries.first().map(|entry| entry.name.as_str())
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Table and column names are case-sensitive on most MySQL installs; keep the
// text byte for byte, trailing spaces included. The two `Competitions_table`
// self joins on `id` cannot express a parent/child relation and are kept
// as-is.
const TENNIS_QUERIES: [(&str, &str); 25] = [
    ("categories_table", "select * from categories_table;"),
    ("competitions_table", "select * from competitions_table;"),
    ("complexes_table", "select * from complexes_table;"),
    ("venues_table", " select * from venues_table;"),
    (
        "competitor_rankings_table",
        "select * from competitor_rankings_table;",
    ),
    ("competitors_table", "select * from competitors_table;"),
    (
        "List all competitions along with their category name",
        " SELECT c.name, cat.category_name 
    FROM competitions_table c 
    JOIN categories_table cat 
    ON c.category_id = cat.category_id;",
    ),
    (
        "Count the number of competitions in each category",
        " SELECT cat.category_name,
    COUNT(c.id) AS competition_count
    FROM competitions_table c
    JOIN categories_table cat
    ON c.category_id = cat.category_id
    GROUP BY cat.category_name;",
    ),
    (
        "Find all competitions of type doubles",
        " SELECT id,`name`,`type`
    FROM competitions_table
    WHERE `type` = 'doubles';",
    ),
    (
        "Get competitions that belong to a specific category (e.g., ITF Men)",
        "SELECT 
    c.id,
    c.`name`,
    c.category_id
FROM 
    competitions_table c
JOIN 
    categories_table cat
ON 
    c.category_id = cat.category_id
WHERE 
    cat.category_name = 'ITF Men';
",
    ),
    (
        "Identify parent competitions and their sub-competitions",
        "SELECT p.`name` AS parent_competition, c.`name` AS sub_competition
FROM Competitions_table c
JOIN Competitions_table p ON c.id = p.id;
",
    ),
    (
        "Analyze the distribution of competition types by category",
        "SELECT 
    cat.category_name,
    c.`type`,
    COUNT(c.id) AS count
FROM 
    competitions_table c
JOIN 
    categories_table cat
ON 
    c.category_id = cat.category_id
GROUP BY 
    cat.category_name, c.`type`
ORDER BY 
    cat.category_name, c.type;
",
    ),
    (
        "List all competitions with no parent top-level competitions",
        " SELECT `name`   
FROM Competitions_table
WHERE id IS NULL;
",
    ),
    (
        "List all venues along with their associated complex name",
        "
SELECT v.venue_name, c.name
FROM Venues_table v
JOIN Complexes_table c ON v.complex_id = c.complex_id;
",
    ),
    (
        "Count the number of venues in each complex",
        "SELECT c.`name`, COUNT(v.venue_id) AS venue_count
FROM Venues_table v
JOIN Complexes_table c ON v.complex_id = c.complex_id
GROUP BY c.`name`;
",
    ),
    (
        "Get details of venues in a specific country (e.g., Chile)",
        "
SELECT *
FROM Venues_table
WHERE country_name = 'Chile';",
    ),
    (
        "Identify all venues and their timezones",
        "SELECT venue_name, timezone
FROM Venues_table;
",
    ),
    (
        "Find complexes that have more than one venue",
        "SELECT c.`name`
FROM Venues_table v
JOIN Complexes_table c ON v.complex_id = c.complex_id
GROUP BY c.`name`
HAVING COUNT(v.venue_id) > 1;
",
    ),
    (
        "List venues grouped by country",
        "SELECT country_name, GROUP_CONCAT(venue_name) AS venues
FROM Venues_table
GROUP BY country_name;
",
    ),
    (
        "Find all venues for a specific complex (e.g., Nacional)",
        "
SELECT v.venue_name
FROM Venues_table v
JOIN Complexes_table c ON v.complex_id = c.complex_id
WHERE c.`name` = 'Nacional';
",
    ),
    (
        "Get all competitors with their rank and points",
        "select rank_id, `rank`, points
from competitor_rankings_table
ORDER BY points ASC;
",
    ),
    (
        "Find competitors ranked in the top 5",
        "select\tc.competitor_id,com.`name`,`rank`
from competitor_rankings_table c
join competitors_table com
on c.competitor_id=com.competitor_id
where `rank` <=5 ;
",
    ),
    (
        "Get the total points of competitors from a specific country (e.g., Croatia)",
        "
select c.points, cat.country, cat.`name`
from competitor_rankings_table c
join competitors_table cat
on c.competitor_id= cat.competitor_id
where country= 'Croatia';
",
    ),
    (
        "Count the number of competitors per country",
        "
select country, country_code, count(competitor_id) AS number_of_competitor
from  Competitors_table
group by country, country_code;
",
    ),
    (
        "Find competitors with the highest points in the current week",
        "
select c.points, cat.competitor_id, cat.`name`
from competitor_rankings_table c
join competitors_table cat
on c.competitor_id=cat.competitor_id
order by c.points ASC;
",
    ),
];
