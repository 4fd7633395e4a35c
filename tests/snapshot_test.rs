use pretty_assertions::assert_eq;

#[test]
fn snapshot_td_chain_with_label() {
    let input = "\
graph TD
    A --> B
    B -- yes --> C
";
    let output = mermaid_drawio::convert(input).unwrap();
    let expected = concat!(
        r#"<mxfile host="mermaid-drawio"><diagram id="mermaid-diagram" name="Page-1">"#,
        r#"<mxGraphModel grid="1" gridSize="10" page="1" pageWidth="850" pageHeight="1100"><root>"#,
        r#"<mxCell id="0"/><mxCell id="1" parent="0"/>"#,
        r#"<mxCell id="2" value="A" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="1">"#,
        r#"<mxGeometry x="0" y="0" width="120" height="60" as="geometry"/></mxCell>"#,
        r#"<mxCell id="3" value="B" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="1">"#,
        r#"<mxGeometry x="0" y="200" width="120" height="60" as="geometry"/></mxCell>"#,
        r#"<mxCell id="4" value="C" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="1">"#,
        r#"<mxGeometry x="0" y="400" width="120" height="60" as="geometry"/></mxCell>"#,
        r#"<mxCell id="5" style="edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;html=1;" edge="1" parent="1" source="2" target="3">"#,
        r#"<mxGeometry relative="1" as="geometry"/></mxCell>"#,
        r#"<mxCell id="6" value="yes" style="edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;html=1;" edge="1" parent="1" source="3" target="4">"#,
        r#"<mxGeometry relative="1" as="geometry"/></mxCell>"#,
        r#"</root></mxGraphModel></diagram></mxfile>"#,
    );
    assert_eq!(output.xml, expected);
}

#[test]
fn snapshot_lr_fan_out() {
    let input = "\
graph LR
    S[Start] --> X
    S --> Y
";
    let output = mermaid_drawio::convert(input).unwrap();
    let geometries: Vec<&str> = output
        .xml
        .match_indices("<mxGeometry x=")
        .map(|(i, _)| {
            let rest = &output.xml[i..];
            &rest[..rest.find("/>").unwrap() + 2]
        })
        .collect();
    assert_eq!(
        geometries,
        vec![
            r#"<mxGeometry x="0" y="0" width="120" height="60" as="geometry"/>"#,
            r#"<mxGeometry x="200" y="0" width="120" height="60" as="geometry"/>"#,
            r#"<mxGeometry x="200" y="120" width="120" height="60" as="geometry"/>"#,
        ]
    );
    assert!(output.xml.contains(r#"value="Start""#));
}
