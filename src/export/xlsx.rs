//! Minimal SpreadsheetML (`.xlsx`) writer.
//!
//! Supports what the statement reports need: inline strings, numbers,
//! dates, bold headers, formulas with cached values and styled tables
//! (including calculated table columns).

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::domain::model::{CellValue, Column, ColumnKey, Transaction};
use crate::domain::rules::RuleSet;
use crate::domain::summary::InstallmentSummary;
use crate::i18n::{translate, Language};
use crate::utils::error::{EtlError, Result};

pub const RULES_SHEET: &str = "Rules";
const TABLE_STYLE: &str = "TableStyleMedium9";
const MAX_SHEET_NAME_LEN: usize = 31;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

// Indexes into cellXfs in styles.xml.
const STYLE_DEFAULT: u32 = 0;
const STYLE_BOLD: u32 = 1;
const STYLE_DATE: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
enum CachedFormulaValue {
    Text(String),
    NotAvailable,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Value { value: CellValue, style: u32 },
    Formula { formula: String, cached: CachedFormulaValue },
}

#[derive(Debug, Clone)]
struct TableColumn {
    name: String,
    formula: Option<String>,
}

#[derive(Debug, Clone)]
struct Table {
    name: String,
    first_row: u32,
    first_col: u32,
    last_row: u32,
    last_col: u32,
    columns: Vec<TableColumn>,
}

impl Table {
    fn reference(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_letter(self.first_col),
            self.first_row,
            column_letter(self.last_col),
            self.last_row
        )
    }
}

#[derive(Debug, Clone)]
struct Sheet {
    name: String,
    // row -> column -> cell, both 1-based
    cells: BTreeMap<u32, BTreeMap<u32, Cell>>,
    tables: Vec<Table>,
}

impl Sheet {
    fn new(name: String) -> Self {
        Self {
            name,
            cells: BTreeMap::new(),
            tables: Vec::new(),
        }
    }

    fn set(&mut self, row: u32, col: u32, cell: Cell) {
        self.cells.entry(row).or_default().insert(col, cell);
    }

    fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        let style = match value {
            CellValue::Date(_) => STYLE_DATE,
            _ => STYLE_DEFAULT,
        };
        self.set(row, col, Cell::Value { value, style });
    }

    fn set_header(&mut self, row: u32, col: u32, label: &str) {
        self.set(
            row,
            col,
            Cell::Value {
                value: CellValue::Text(label.to_string()),
                style: STYLE_BOLD,
            },
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Sheet names are compared the way spreadsheet apps do, ignoring case.
    pub fn has_sheet(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.sheets.iter().any(|s| s.name.to_lowercase() == name)
    }

    /// `name` sanitized, with a `_2`, `_3`, ... suffix when a sheet of that
    /// name already exists. Stays within the sheet name length limit.
    pub fn unique_sheet_name(&self, name: &str) -> String {
        let base = sanitize_sheet_name(name);
        if !self.has_sheet(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let suffix = format!("_{}", n);
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            let candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            if !self.has_sheet(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn table_names(&self) -> impl Iterator<Item = &str> {
        self.sheets
            .iter()
            .flat_map(|s| s.tables.iter().map(|t| t.name.as_str()))
    }

    fn unique_table_name(&self, base: &str) -> String {
        let base = sanitize_table_name(base);
        let taken = |candidate: &str| {
            self.table_names()
                .any(|existing| existing.eq_ignore_ascii_case(candidate))
        };
        if !taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Adds the `Rules` sheet; a second call leaves the existing one alone.
    pub fn add_rules_sheet(&mut self, rules: &RuleSet, language: Language) {
        if self.has_sheet(RULES_SHEET) {
            return;
        }

        let pattern_label = translate("pattern", language);
        let category_label = translate("category", language);

        let mut sheet = Sheet::new(RULES_SHEET.to_string());
        sheet.set_header(1, 1, pattern_label);
        sheet.set_header(1, 2, category_label);
        for (i, rule) in rules.rules().iter().enumerate() {
            let row = i as u32 + 2;
            sheet.set_value(row, 1, CellValue::Text(rule.pattern.clone()));
            sheet.set_value(row, 2, CellValue::Text(rule.category.clone()));
        }

        let name = self.unique_table_name(RULES_SHEET);
        sheet.tables.push(Table {
            name,
            first_row: 1,
            first_col: 1,
            last_row: rules.len().max(1) as u32 + 1,
            last_col: 2,
            columns: vec![
                TableColumn {
                    name: pattern_label.to_string(),
                    formula: None,
                },
                TableColumn {
                    name: category_label.to_string(),
                    formula: None,
                },
            ],
        });

        self.sheets.push(sheet);
    }

    /// Adds a sheet holding one table row per transaction. When `rules` is
    /// non-empty, the category column becomes a calculated column that looks
    /// the store up in the `Rules` table. Returns the sheet's index.
    pub fn add_transactions_sheet(
        &mut self,
        name: &str,
        columns: &[Column],
        transactions: &[Transaction],
        rules: &RuleSet,
        language: Language,
    ) -> Result<usize> {
        let sheet_name = sanitize_sheet_name(name);
        if self.has_sheet(&sheet_name) {
            return Err(EtlError::DuplicateSheet { name: sheet_name });
        }

        let table_name = self.unique_table_name(&format!("{}_transactions", sheet_name));
        let category_formula = if rules.is_empty() {
            None
        } else {
            category_formula(&table_name, columns, language)
        };

        let mut sheet = Sheet::new(sheet_name);
        for (col, (_, label)) in columns.iter().enumerate() {
            sheet.set_header(1, col as u32 + 1, label);
        }

        for (i, tx) in transactions.iter().enumerate() {
            let row = i as u32 + 2;
            for (col, (key, _)) in columns.iter().enumerate() {
                let col = col as u32 + 1;
                match (key, &category_formula) {
                    (ColumnKey::Category, Some(formula)) => {
                        let cached = match &tx.category {
                            Some(category) => CachedFormulaValue::Text(category.clone()),
                            None => CachedFormulaValue::NotAvailable,
                        };
                        sheet.set(
                            row,
                            col,
                            Cell::Formula {
                                formula: formula.clone(),
                                cached,
                            },
                        );
                    }
                    _ => sheet.set_value(row, col, key.value(tx)),
                }
            }
        }

        // A table needs at least one data row, even an empty one.
        let last_row = transactions.len().max(1) as u32 + 1;
        sheet.tables.push(Table {
            name: table_name,
            first_row: 1,
            first_col: 1,
            last_row,
            last_col: columns.len().max(1) as u32,
            columns: columns
                .iter()
                .map(|(key, label)| TableColumn {
                    name: label.clone(),
                    formula: match key {
                        ColumnKey::Category => category_formula.clone(),
                        _ => None,
                    },
                })
                .collect(),
        });

        self.sheets.push(sheet);
        Ok(self.sheets.len() - 1)
    }

    /// Writes the installment summary as its own table, starting at row 1 of
    /// column `start_col` (1-based) on the given sheet.
    pub fn add_summary_section(
        &mut self,
        sheet_index: usize,
        summary: &InstallmentSummary,
        start_col: u32,
        language: Language,
    ) -> Result<()> {
        let base_name = match self.sheets.get(sheet_index) {
            Some(sheet) => format!("{}_summary", sheet.name),
            None => {
                return Err(EtlError::ProcessingError {
                    message: format!("no sheet at index {}", sheet_index),
                })
            }
        };
        let table_name = self.unique_table_name(&base_name);

        let months_label = translate("over_x_months", language);
        let sum_label = translate("sum", language);
        let rows = summary.rows();

        let sheet = &mut self.sheets[sheet_index];
        sheet.set_header(1, start_col, months_label);
        sheet.set_header(1, start_col + 1, sum_label);
        for (i, (months, sum)) in rows.iter().enumerate() {
            let row = i as u32 + 2;
            sheet.set_value(row, start_col, CellValue::Number(*months as f64));
            sheet.set_value(row, start_col + 1, CellValue::Number(*sum));
        }

        sheet.tables.push(Table {
            name: table_name,
            first_row: 1,
            first_col: start_col,
            last_row: rows.len().max(1) as u32 + 1,
            last_col: start_col + 1,
            columns: vec![
                TableColumn {
                    name: months_label.to_string(),
                    formula: None,
                },
                TableColumn {
                    name: sum_label.to_string(),
                    formula: None,
                },
            ],
        });
        Ok(())
    }

    /// Serializes the workbook into an `.xlsx` zip package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut table_id = 0u32;
        let mut table_paths = Vec::new();
        for (i, sheet) in self.sheets.iter().enumerate() {
            let sheet_no = i + 1;
            zip.start_file(format!("xl/worksheets/sheet{}.xml", sheet_no), options)?;
            zip.write_all(sheet_xml(sheet).as_bytes())?;

            if sheet.tables.is_empty() {
                continue;
            }

            let mut rels = Vec::new();
            for table in &sheet.tables {
                table_id += 1;
                let path = format!("xl/tables/table{}.xml", table_id);
                zip.start_file(path.as_str(), options)?;
                zip.write_all(table_xml(table, table_id).as_bytes())?;
                rels.push(format!("../tables/table{}.xml", table_id));
                table_paths.push(path);
            }

            zip.start_file(
                format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_no),
                options,
            )?;
            zip.write_all(sheet_rels_xml(&rels).as_bytes())?;
        }

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels_xml().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(styles_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(root_rels_xml().as_bytes())?;

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types_xml(&table_paths).as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn workbook_xml(&self) -> String {
        let mut xml = format!(
            r#"{}<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
            XML_HEADER, NS_MAIN, NS_REL
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(&sheet.name),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels_xml(&self) -> String {
        let mut xml = format!(r#"{}<Relationships xmlns="{}">"#, XML_HEADER, NS_PKG_REL);
        for i in 0..self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                NS_REL,
                i + 1
            ));
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1,
            NS_REL
        ));
        xml.push_str("</Relationships>");
        xml
    }

    fn content_types_xml(&self, table_paths: &[String]) -> String {
        let mut xml = format!(
            concat!(
                r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
                r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            ),
            XML_HEADER
        );
        for i in 0..self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }
        for path in table_paths {
            xml.push_str(&format!(
                r#"<Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"/>"#,
                path
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

/// `INDEX(Rules[cat], MATCH(1, INDEX(--ISNUMBER(SEARCH(Rules[pat], store)),0),0))`
/// in stored (non-UI) structured reference syntax.
fn category_formula(table_name: &str, columns: &[Column], language: Language) -> Option<String> {
    let has_category = columns.iter().any(|(key, _)| *key == ColumnKey::Category);
    let (_, store_label) = columns.iter().find(|(key, _)| *key == ColumnKey::Store)?;
    if !has_category {
        return None;
    }

    Some(format!(
        "INDEX({rules}[{category}],MATCH(1,INDEX(--ISNUMBER(SEARCH(INDEX({rules}[{pattern}],0),{table}[[#This Row],[{store}]])),0),0))",
        rules = RULES_SHEET,
        category = escape_structured_ref(translate("category", language)),
        pattern = escape_structured_ref(translate("pattern", language)),
        table = table_name,
        store = escape_structured_ref(store_label),
    ))
}

/// 1-based column number to its letter name (`1 -> A`, `27 -> AA`).
pub fn column_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Days since 1899-12-30, the spreadsheet date epoch.
pub fn excel_serial_date(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days()
}

pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        "Transactions".to_string()
    } else {
        cleaned
    }
}

pub fn sanitize_table_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
        .collect();
    if !cleaned.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        cleaned.insert(0, '_');
    }
    cleaned
}

fn escape_structured_ref(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '[' | ']' | '#' | '\'') {
            escaped.push('\'');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn cell_xml(reference: &str, cell: &Cell) -> String {
    match cell {
        Cell::Value { value, style } => {
            let style_attr = if *style == STYLE_DEFAULT {
                String::new()
            } else {
                format!(r#" s="{}""#, style)
            };
            match value {
                CellValue::Text(text) => format!(
                    r#"<c r="{}"{} t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    reference,
                    style_attr,
                    escape_xml(text)
                ),
                CellValue::Number(n) if n.is_finite() => {
                    format!(r#"<c r="{}"{}><v>{}</v></c>"#, reference, style_attr, n)
                }
                CellValue::Date(date) => format!(
                    r#"<c r="{}"{}><v>{}</v></c>"#,
                    reference,
                    style_attr,
                    excel_serial_date(*date)
                ),
                CellValue::Number(_) | CellValue::Empty => String::new(),
            }
        }
        Cell::Formula { formula, cached } => match cached {
            CachedFormulaValue::Text(text) => format!(
                r#"<c r="{}" t="str"><f>{}</f><v>{}</v></c>"#,
                reference,
                escape_xml(formula),
                escape_xml(text)
            ),
            CachedFormulaValue::NotAvailable => format!(
                r#"<c r="{}" t="e"><f>{}</f><v>#N/A</v></c>"#,
                reference,
                escape_xml(formula)
            ),
        },
    }
}

fn sheet_xml(sheet: &Sheet) -> String {
    let mut xml = format!(
        r#"{}<worksheet xmlns="{}" xmlns:r="{}"><sheetData>"#,
        XML_HEADER, NS_MAIN, NS_REL
    );
    for (row, cells) in &sheet.cells {
        xml.push_str(&format!(r#"<row r="{}">"#, row));
        for (col, cell) in cells {
            let reference = format!("{}{}", column_letter(*col), row);
            xml.push_str(&cell_xml(&reference, cell));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.tables.is_empty() {
        xml.push_str(&format!(r#"<tableParts count="{}">"#, sheet.tables.len()));
        for i in 0..sheet.tables.len() {
            xml.push_str(&format!(r#"<tablePart r:id="rId{}"/>"#, i + 1));
        }
        xml.push_str("</tableParts>");
    }
    xml.push_str("</worksheet>");
    xml
}

fn sheet_rels_xml(targets: &[String]) -> String {
    let mut xml = format!(r#"{}<Relationships xmlns="{}">"#, XML_HEADER, NS_PKG_REL);
    for (i, target) in targets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/table" Target="{}"/>"#,
            i + 1,
            NS_REL,
            target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn table_xml(table: &Table, id: u32) -> String {
    let reference = table.reference();
    let mut xml = format!(
        r#"{}<table xmlns="{}" id="{}" name="{}" displayName="{}" ref="{}" totalsRowShown="0"><autoFilter ref="{}"/><tableColumns count="{}">"#,
        XML_HEADER,
        NS_MAIN,
        id,
        escape_xml(&table.name),
        escape_xml(&table.name),
        reference,
        reference,
        table.columns.len()
    );
    for (i, column) in table.columns.iter().enumerate() {
        match &column.formula {
            Some(formula) => xml.push_str(&format!(
                r#"<tableColumn id="{}" name="{}"><calculatedColumnFormula>{}</calculatedColumnFormula></tableColumn>"#,
                i + 1,
                escape_xml(&column.name),
                escape_xml(formula)
            )),
            None => xml.push_str(&format!(
                r#"<tableColumn id="{}" name="{}"/>"#,
                i + 1,
                escape_xml(&column.name)
            )),
        }
    }
    xml.push_str(&format!(
        r#"</tableColumns><tableStyleInfo name="{}" showFirstColumn="0" showLastColumn="0" showRowStripes="1" showColumnStripes="0"/></table>"#,
        TABLE_STYLE
    ));
    xml
}

fn styles_xml() -> String {
    format!(
        concat!(
            r#"{}<styleSheet xmlns="{}">"#,
            r#"<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="3">"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
            r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
            r#"<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
            r#"</cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            r#"</styleSheet>"#,
        ),
        XML_HEADER, NS_MAIN
    )
}

fn root_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        XML_HEADER, NS_PKG_REL, NS_REL
    )
}
