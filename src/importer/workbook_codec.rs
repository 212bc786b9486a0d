// ==========================================
// 目录数据交换 - 工作簿编解码器
// ==========================================
// 职责: 单工作表 xlsx 的读写（仅字符串单元格）
// 读取: calamine（共享字符串 + 内联字符串）
// 写出: zip 容器 + SpreadsheetML（共享字符串表）
// 红线: 不感知任何业务类型；不支持样式/公式/多工作表
// ==========================================

use crate::importer::error::{EngineResult, ImportError};
use calamine::{Data, Reader, Xlsx};
use quick_xml::escape::escape;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Excel 工作表名称最大长度
const MAX_SHEET_NAME_LEN: usize = 31;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

// ==========================================
// 列名换算（双射 26 进制）
// ==========================================

/// 将 1 起始的列序号转换为列名
///
/// 1→A, 26→Z, 27→AA, 52→AZ, 702→ZZ, 703→AAA。
/// 不存在表示 0 的字母，每一位先取 (n-1) mod 26，再以 (n-1) div 26 进位。
/// 序号 0 返回空串。
pub fn column_name(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

// ==========================================
// 编码
// ==========================================

/// 写出单工作表工作簿
///
/// 第 1 行为表头，其后每行按列序号放置字符串单元格。空字符串不落单元格（全空行除外）。
pub fn encode(sheet_name: &str, header: &[String], rows: &[Vec<String>]) -> EngineResult<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let mut sheet_xml = String::with_capacity(4096);

    let width = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    let height = rows.len() + 1;

    sheet_xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    sheet_xml.push('\n');
    sheet_xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    if width > 0 {
        sheet_xml.push_str(&format!(
            "<dimension ref=\"A1:{}{}\"/>",
            column_name(width),
            height
        ));
    }
    sheet_xml.push_str("<sheetData>");
    write_row(&mut sheet_xml, &mut strings, 1, header);
    for (offset, row) in rows.iter().enumerate() {
        write_row(&mut sheet_xml, &mut strings, offset + 2, row);
    }
    sheet_xml.push_str("</sheetData></worksheet>");

    debug!(
        sheet = sheet_name,
        rows = height,
        columns = width,
        unique_strings = strings.values.len(),
        "工作表 XML 生成完成"
    );

    write_package(sheet_name, &sheet_xml, Some(&strings.to_xml()))
}

/// 写出一行 `<row>`（空值跳过，但列位置保持不变）
///
/// 全空行在 A 列写一个空共享字符串，否则读取端会把末尾的空行截掉。
fn write_row(out: &mut String, strings: &mut SharedStrings, row_number: usize, cells: &[String]) {
    out.push_str(&format!("<row r=\"{}\">", row_number));
    let mut written = 0;
    for (col_idx, value) in cells.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        push_shared_cell(out, col_idx + 1, row_number, strings.intern(value));
        written += 1;
    }
    if written == 0 {
        push_shared_cell(out, 1, row_number, strings.intern(""));
    }
    out.push_str("</row>");
}

fn push_shared_cell(out: &mut String, column: usize, row_number: usize, string_idx: usize) {
    out.push_str(&format!(
        "<c r=\"{}{}\" t=\"s\"><v>{}</v></c>",
        column_name(column),
        row_number,
        string_idx
    ));
}

/// 共享字符串表（去重）
#[derive(Default)]
struct SharedStrings {
    values: Vec<String>,
    index: HashMap<String, usize>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        self.references += 1;
        if let Some(&idx) = self.index.get(value) {
            return idx;
        }
        let idx = self.values.len();
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), idx);
        idx
    }

    fn to_xml(&self) -> String {
        let mut out = String::with_capacity(64 + self.values.len() * 32);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push('\n');
        out.push_str(&format!(
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.values.len()
        ));
        for value in &self.values {
            out.push_str("<si>");
            push_text_element(&mut out, value);
            out.push_str("</si>");
        }
        out.push_str("</sst>");
        out
    }
}

/// 写出 `<t>`，首尾空白需要 xml:space="preserve"
fn push_text_element(out: &mut String, value: &str) {
    if value.trim() != value {
        out.push_str(r#"<t xml:space="preserve">"#);
    } else {
        out.push_str("<t>");
    }
    out.push_str(&escape(value));
    out.push_str("</t>");
}

/// 清理工作表名称（Excel 禁止 []:*?/\，最长 31 字符）
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// 打包 xlsx 容器
///
/// shared_strings 为 None 时不写共享字符串表（单元格只能使用内联字符串）。
pub(crate) fn write_package(
    sheet_name: &str,
    sheet_xml: &str,
    shared_strings: Option<&str>,
) -> EngineResult<Vec<u8>> {
    let workbook_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape(&sanitize_sheet_name(sheet_name))
    );

    let mut workbook_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    );
    if shared_strings.is_some() {
        workbook_rels.push_str(
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        );
    }
    workbook_rels.push_str("</Relationships>");

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut parts: Vec<(&str, &str)> = vec![
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("xl/workbook.xml", workbook_xml.as_str()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_str()),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ];
    if let Some(sst) = shared_strings {
        parts.push(("xl/sharedStrings.xml", sst));
    }

    for (name, content) in parts {
        writer.start_file(name, options)?;
        writer.write_all(content.as_bytes())?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

// ==========================================
// 解码
// ==========================================

/// 读取第一个工作表的全部行（按原始位置，空单元格为空串）
///
/// # 错误
/// - MalformedWorkbook: 非 xlsx 容器 / 无工作表 / 工作表无法解析
pub fn decode(bytes: &[u8]) -> EngineResult<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

    let sheet_names = workbook.sheet_names();
    let first_sheet = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ImportError::MalformedWorkbook("工作簿无工作表".to_string()))?;

    let range = workbook.worksheet_range(&first_sheet)?;

    // calamine 的 Range 从第一个非空单元格开始，这里补齐到 A1 起始的绝对位置
    let (start_row, start_col) = match range.start() {
        Some(start) => start,
        None => return Ok(Vec::new()),
    };

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(start_row as usize + range.height());
    rows.extend((0..start_row).map(|_| Vec::new()));
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_to_string));
        rows.push(cells);
    }

    debug!(sheet = %first_sheet, rows = rows.len(), "工作表解码完成");
    Ok(rows)
}

/// 单元格转字符串（整数值浮点去掉 ".0"）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
