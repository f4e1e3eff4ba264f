// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::path::PathBuf;
use tabula_app::{BudgetSnapshot, CellValue, Row};
use time::{Date, Duration, Month};

pub const ORDER_STATUSES: [&str; 5] = [
    "Delivered",
    "Refunded",
    "Pending",
    "En Route",
    "Unfulfillable",
];
/// Relative frequency of each entry in [`ORDER_STATUSES`], in percent.
const ORDER_STATUS_WEIGHTS: [usize; 5] = [45, 5, 10, 35, 5];
const DISCOUNTS: [(i64, usize); 4] = [(0, 70), (10, 15), (25, 10), (50, 5)];

const STAFF_ACCOUNTS: [(&str, bool); 3] =
    [("admin", true), ("employee01", false), ("employee02", false)];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const STREET_NAMES: [&str; 12] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Birch", "Juniper", "Sunset", "Ridge",
    "Valley", "Lakeview",
];
const CITIES: [(&str, &str); 8] = [
    ("Austin", "TX"),
    ("Seattle", "WA"),
    ("Denver", "CO"),
    ("Madison", "WI"),
    ("Raleigh", "NC"),
    ("Portland", "OR"),
    ("Boise", "ID"),
    ("Omaha", "NE"),
];

const CATEGORIES: [(&str, &str); 5] = [
    ("Office Supplies", "Paper, pens, and desk essentials"),
    ("Electronics", "Computers, peripherals, and accessories"),
    ("Furniture", "Desks, chairs, and storage"),
    ("Kitchen", "Break room appliances and supplies"),
    ("Cleaning", "Janitorial products"),
];

/// Product catalog: name, index into [`CATEGORIES`], description.
const PRODUCTS: [(&str, usize, &str); 15] = [
    ("Copy Paper", 0, "Ten reams of letter paper"),
    ("Gel Pens", 0, "Box of twelve black pens"),
    ("Stapler", 0, "Full-strip desktop stapler"),
    ("Wireless Mouse", 1, "Two-button optical mouse"),
    ("USB-C Hub", 1, "Seven-port powered hub"),
    ("Monitor 27in", 1, "QHD IPS display"),
    ("Mechanical Keyboard", 1, "Tenkeyless keyboard"),
    ("Standing Desk", 2, "Electric sit-stand desk"),
    ("Task Chair", 2, "Mesh back office chair"),
    ("Filing Cabinet", 2, "Three-drawer steel cabinet"),
    ("Coffee Maker", 3, "Twelve-cup drip brewer"),
    ("Electric Kettle", 3, "1.7 liter kettle"),
    ("Paper Towels", 4, "Case of twelve rolls"),
    ("Disinfectant Wipes", 4, "Canister of eighty wipes"),
    ("Floor Cleaner", 4, "Concentrated floor cleaner"),
];

pub const INVENTORY_SCHEMA: &str = "
CREATE TABLE Staff (
    staff_id VARCHAR PRIMARY KEY UNIQUE NOT NULL,
    username TEXT NOT NULL,
    password BLOB NOT NULL,
    is_admin BOOLEAN NOT NULL
);
CREATE TABLE Customers (
    customer_id VARCHAR PRIMARY KEY UNIQUE NOT NULL,
    first_name VARCHAR (40) NOT NULL,
    last_name VARCHAR (40) NOT NULL,
    address VARCHAR (100) NOT NULL,
    phone VARCHAR (20),
    email VARCHAR (50) NOT NULL,
    staff_id VARCHAR REFERENCES Staff (staff_id) ON DELETE CASCADE ON UPDATE CASCADE
);
CREATE TABLE Categories (
    category_id INTEGER PRIMARY KEY UNIQUE NOT NULL,
    category_name VARCHAR (40) NOT NULL,
    category_description VARCHAR (100)
);
CREATE TABLE Products (
    product_id VARCHAR PRIMARY KEY UNIQUE NOT NULL,
    product_name VARCHAR (100) NOT NULL,
    product_description VARCHAR (240),
    product_price REAL,
    category_id INTEGER REFERENCES Categories (category_id) ON DELETE CASCADE ON UPDATE CASCADE
);
CREATE TABLE Orders (
    order_id VARCHAR PRIMARY KEY UNIQUE NOT NULL,
    date_of_order DATE NOT NULL,
    order_status VARCHAR (40) NOT NULL,
    unit_price REAL,
    quantity INT (10),
    discount REAL,
    total REAL,
    product_id VARCHAR REFERENCES Products (product_id) ON DELETE CASCADE ON UPDATE CASCADE,
    customer_id VARCHAR REFERENCES Customers (customer_id) ON DELETE CASCADE ON UPDATE CASCADE
);
";

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub staff_id: String,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub staff_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_id: String,
    pub date_of_order: Date,
    pub status: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub discount_percent: i64,
    pub total_cents: i64,
    pub product_id: String,
    pub customer_id: String,
}

/// How many customers and orders to generate. Staff, categories and
/// products come from fixed lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSize {
    pub customers: usize,
    pub orders: usize,
}

impl SeedSize {
    pub const fn small() -> Self {
        Self {
            customers: 12,
            orders: 40,
        }
    }

    pub const fn demo() -> Self {
        Self {
            customers: 250,
            orders: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub staff: Vec<StaffMember>,
    pub customers: usize,
    pub categories: usize,
    pub products: usize,
    pub orders: usize,
}

/// Deterministic generator for inventory records. The same seed always
/// yields the same rows.
#[derive(Debug, Clone)]
pub struct InventoryFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl InventoryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn staff(&mut self) -> Vec<StaffMember> {
        let mut staff: Vec<StaffMember> = Vec::with_capacity(STAFF_ACCOUNTS.len());
        for (username, is_admin) in STAFF_ACCOUNTS {
            let staff_id = loop {
                let candidate = format!("{:04}", self.rng.int_n(10_000));
                if !staff.iter().any(|member| member.staff_id == candidate) {
                    break candidate;
                }
            };
            staff.push(StaffMember {
                staff_id,
                username: username.to_owned(),
                is_admin,
            });
        }
        staff
    }

    pub fn customer(&mut self, customer_id: String, staff: &[StaffMember]) -> Customer {
        let first_name = self.pick(&FIRST_NAMES).to_owned();
        let last_name = self.pick(&LAST_NAMES).to_owned();
        let (city, state) = CITIES[self.rng.int_n(CITIES.len())];
        let address = format!(
            "{} {} St, {city}, {state} {:05}",
            self.int_range(100, 9_999),
            self.pick(&STREET_NAMES),
            self.int_range(10_000, 99_999),
        );
        let phone = format!(
            "({}) {}-{:04}",
            self.int_range(200, 989),
            self.int_range(200, 999),
            self.int_range(0, 9_999),
        );
        let email = format!("{last_name}{first_name}.@company.com");
        let staff_id = staff
            .get(self.rng.int_n(staff.len()))
            .map(|member| member.staff_id.clone())
            .unwrap_or_default();
        Customer {
            customer_id,
            first_name,
            last_name,
            address,
            phone,
            email,
            staff_id,
        }
    }

    pub fn product(&mut self, index: usize) -> Option<Product> {
        let (name, category, description) = PRODUCTS.get(index)?;
        Some(Product {
            product_id: format!("P{:04}", 1_000 + index),
            name: (*name).to_owned(),
            description: (*description).to_owned(),
            price_cents: self.int_range(199, 49_999),
            category_id: (*category as i64) + 1,
        })
    }

    pub fn order(&mut self, order_id: String, product: &Product, customer_id: String) -> Order {
        let start = Date::from_calendar_date(2020, Month::January, 1).unwrap_or(Date::MIN);
        let date_of_order = start + Duration::days(self.int_range(0, 2_190));
        let status = ORDER_STATUSES[self.weighted(&ORDER_STATUS_WEIGHTS)].to_owned();
        let discount_weights = DISCOUNTS.map(|(_, weight)| weight);
        let discount_percent = DISCOUNTS[self.weighted(&discount_weights)].0;
        let quantity = self.int_range(1, 4);
        Order {
            order_id,
            date_of_order,
            status,
            unit_price_cents: product.price_cents,
            quantity,
            discount_percent,
            total_cents: order_total_cents(product.price_cents, discount_percent, quantity),
            product_id: product.product_id.clone(),
            customer_id,
        }
    }

    fn order_id(&mut self) -> String {
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        (0..10)
            .map(|_| char::from(ALPHABET[self.rng.int_n(ALPHABET.len())]))
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn weighted(&mut self, weights: &[usize]) -> usize {
        let total = weights.iter().sum::<usize>();
        let mut roll = self.rng.int_n(total);
        for (index, weight) in weights.iter().enumerate() {
            if roll < *weight {
                return index;
            }
            roll -= weight;
        }
        weights.len().saturating_sub(1)
    }
}

/// Discounted line total in cents, rounded half away from zero.
pub fn order_total_cents(unit_price_cents: i64, discount_percent: i64, quantity: i64) -> i64 {
    let scaled = unit_price_cents * (100 - discount_percent) * quantity;
    (scaled + 50).div_euclid(100)
}

pub fn create_inventory_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(INVENTORY_SCHEMA)
        .context("create inventory schema")
}

/// Creates the inventory tables and fills them with generated records.
pub fn seed_inventory(conn: &Connection, seed: u64, size: SeedSize) -> Result<SeedSummary> {
    create_inventory_schema(conn)?;
    let mut faker = InventoryFaker::new(seed);

    let staff = faker.staff();
    for member in &staff {
        let password = (0..16)
            .map(|_| faker.rng.int_n(256) as u8)
            .collect::<Vec<_>>();
        conn.execute(
            "INSERT INTO Staff (staff_id, username, password, is_admin) VALUES (?1, ?2, ?3, ?4)",
            params![member.staff_id, member.username, password, member.is_admin],
        )
        .with_context(|| format!("insert staff {}", member.username))?;
    }

    let mut customer_ids = Vec::with_capacity(size.customers);
    for index in 0..size.customers {
        let customer = faker.customer(format!("{:06}", 100_000 + index), &staff);
        conn.execute(
            "INSERT INTO Customers (customer_id, first_name, last_name, address, phone, email, staff_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                customer.customer_id,
                customer.first_name,
                customer.last_name,
                customer.address,
                customer.phone,
                customer.email,
                customer.staff_id,
            ],
        )
        .with_context(|| format!("insert customer {}", customer.customer_id))?;
        customer_ids.push(customer.customer_id);
    }

    for (name, description) in CATEGORIES {
        conn.execute(
            "INSERT INTO Categories (category_name, category_description) VALUES (?1, ?2)",
            params![name, description],
        )
        .with_context(|| format!("insert category {name}"))?;
    }

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for index in 0..PRODUCTS.len() {
        let Some(product) = faker.product(index) else {
            continue;
        };
        conn.execute(
            "INSERT INTO Products (product_id, product_name, product_description, product_price, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                product.product_id,
                product.name,
                product.description,
                cents_to_dollars(product.price_cents),
                product.category_id,
            ],
        )
        .with_context(|| format!("insert product {}", product.product_id))?;
        products.push(product);
    }

    let mut orders = 0;
    if !products.is_empty() && !customer_ids.is_empty() {
        let mut used = std::collections::BTreeSet::new();
        while orders < size.orders {
            let order_id = faker.order_id();
            if !used.insert(order_id.clone()) {
                continue;
            }
            let product = &products[faker.rng.int_n(products.len())];
            let customer_id = customer_ids[faker.rng.int_n(customer_ids.len())].clone();
            let order = faker.order(order_id, product, customer_id);
            conn.execute(
                "INSERT INTO Orders (order_id, date_of_order, order_status, unit_price, quantity, discount, total, product_id, customer_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    order.order_id,
                    tabula_app::validation::format_date(order.date_of_order),
                    order.status,
                    cents_to_dollars(order.unit_price_cents),
                    order.quantity,
                    order.discount_percent as f64,
                    cents_to_dollars(order.total_cents),
                    order.product_id,
                    order.customer_id,
                ],
            )
            .with_context(|| format!("insert order {}", order.order_id))?;
            orders += 1;
        }
    }

    Ok(SeedSummary {
        staff,
        customers: customer_ids.len(),
        categories: CATEGORIES.len(),
        products: products.len(),
        orders,
    })
}

fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// A small income ledger and expense ledger with a known remainder of
/// $1,234.56 - $987.65 = $246.91.
pub fn sample_ledgers() -> (Vec<Row>, Vec<Row>) {
    let income = vec![
        ledger_row("Salary", 100_000),
        ledger_row("Freelance", 23_456),
    ];
    let expenses = vec![
        ledger_row("Rent", 75_000),
        ledger_row("Groceries", 18_765),
        ledger_row("Internet", 5_000),
    ];
    (income, expenses)
}

pub fn sample_budget_snapshot() -> BudgetSnapshot {
    BudgetSnapshot {
        income: vec![
            pair("Salary", "$1000.00"),
            pair("Freelance", "$234.56"),
            pair("", "$0.00"),
        ],
        expenses: vec![
            pair("Rent", "$750.00"),
            pair("Groceries", "$187.65"),
            pair("Internet", "$50.00"),
            pair("", "$0.00"),
        ],
    }
}

fn ledger_row(item: &str, cents: i64) -> Row {
    vec![CellValue::text(item), CellValue::Currency(cents)]
}

fn pair(item: &str, amount: &str) -> (String, String) {
    (item.to_owned(), amount.to_owned())
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("inventory.db");
    Ok((dir, db_path))
}

#[cfg(test)]
mod tests {
    use super::{
        InventoryFaker, ORDER_STATUSES, SeedSize, order_total_cents, sample_ledgers,
        seed_inventory,
    };
    use anyhow::Result;
    use rusqlite::Connection;

    #[test]
    fn same_seed_same_staff() {
        let mut left = InventoryFaker::new(42);
        let mut right = InventoryFaker::new(42);
        assert_eq!(left.staff(), right.staff());
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(InventoryFaker::new(0).seed(), 1);
    }

    #[test]
    fn staff_ids_are_unique_four_digit_strings() {
        for seed in 0_u64..50 {
            let staff = InventoryFaker::new(seed).staff();
            assert_eq!(staff.len(), 3);
            assert!(staff[0].is_admin);
            for member in &staff {
                assert_eq!(member.staff_id.len(), 4, "seed {seed}");
            }
            assert_ne!(staff[0].staff_id, staff[1].staff_id);
            assert_ne!(staff[1].staff_id, staff[2].staff_id);
            assert_ne!(staff[0].staff_id, staff[2].staff_id);
        }
    }

    #[test]
    fn customer_phone_fits_the_phone_mask() {
        let mut faker = InventoryFaker::new(7);
        let staff = faker.staff();
        let customer = faker.customer("100000".to_owned(), &staff);
        assert!(tabula_app::validation::matches_mask("(999) 999-9999", &customer.phone));
        assert!(staff.iter().any(|member| member.staff_id == customer.staff_id));
    }

    #[test]
    fn order_totals_apply_discount() {
        assert_eq!(order_total_cents(1_000, 0, 2), 2_000);
        assert_eq!(order_total_cents(1_999, 25, 3), 4_498);
        assert_eq!(order_total_cents(999, 50, 1), 500);
    }

    #[test]
    fn orders_use_known_statuses() {
        let mut faker = InventoryFaker::new(9);
        let product = faker.product(0).expect("catalog has a first product");
        for index in 0..50 {
            let order = faker.order(format!("ORDER{index:05}"), &product, "100000".to_owned());
            assert!(ORDER_STATUSES.contains(&order.status.as_str()));
            assert!((1..=4).contains(&order.quantity));
            assert!(order.total_cents <= order.unit_price_cents * order.quantity);
        }
    }

    #[test]
    fn seeded_database_satisfies_foreign_keys() -> Result<()> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let summary = seed_inventory(&conn, 11, SeedSize::small())?;
        assert_eq!(summary.customers, SeedSize::small().customers);
        assert_eq!(summary.orders, SeedSize::small().orders);

        let mut check = conn.prepare("PRAGMA foreign_key_check")?;
        let violations = check.query_map([], |_| Ok(()))?.count();
        assert_eq!(violations, 0);
        Ok(())
    }

    #[test]
    fn sample_ledgers_have_known_totals() {
        let (income, expenses) = sample_ledgers();
        let sum = |rows: &[tabula_app::Row]| {
            rows.iter()
                .filter_map(|row| row[1].as_cents())
                .sum::<i64>()
        };
        assert_eq!(sum(&income), 123_456);
        assert_eq!(sum(&expenses), 98_765);
    }
}
